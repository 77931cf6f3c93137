//! OCTET STRING rendering by DISPLAY-HINT.
//!
//! Only two renderings exist: colon-grouped hex for `1x:` (MacAddress,
//! PhysAddress) and the bytes as text for everything else. Octets that are
//! not valid UTF-8 cannot be text and fall back to grouped hex.

use std::fmt::Write;

use crate::error::{Error, Result};

/// DISPLAY-HINT rendered as colon-separated hex octets.
pub const GROUPED_HEX: &str = "1x:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    /// `de:ad:be:ef`
    GroupedHex,
    /// Bytes as a string, verbatim when they are UTF-8.
    #[default]
    Text,
}

impl DisplayFormat {
    /// Format for a column's hint. An absent hint is text; an unrecognised
    /// one is an [`Error::UnresolvedFormat`] the caller may fall back from.
    pub fn from_hint(column: &str, hint: Option<&str>) -> Result<Self> {
        match hint {
            None => Ok(DisplayFormat::Text),
            Some(GROUPED_HEX) => Ok(DisplayFormat::GroupedHex),
            Some(other) => Err(Error::UnresolvedFormat {
                column: column.to_string(),
                hint: other.to_string(),
            }),
        }
    }

    pub fn render(self, bytes: &[u8]) -> String {
        match self {
            DisplayFormat::GroupedHex => grouped_hex(bytes),
            DisplayFormat::Text => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => grouped_hex(bytes),
            },
        }
    }
}

/// Lowercase two-digit hex per byte, joined by `:`.
///
/// ```
/// use snmp_table::collector::format::grouped_hex;
///
/// assert_eq!(grouped_hex(&[0xde, 0xad, 0xbe, 0xef]), "de:ad:be:ef");
/// assert_eq!(grouped_hex(&[]), "");
/// ```
pub fn grouped_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}
