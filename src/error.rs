//! Error types for a poll cycle.
//!
//! Every variant is fatal for the cycle that produced it: the pipeline either
//! yields a complete metric set or nothing. [`Error::UnresolvedFormat`] is the
//! one exception, it is built by the collector only to be logged before the
//! value falls back to verbatim decoding.

use crate::snmp::Oid;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for schema resolution, collection, reconstruction and
/// metric derivation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Table identifier is neither a numeric OID nor `MODULE::name`.
    #[error("invalid table identifier: {identifier:?}")]
    InvalidIdentifier { identifier: String },

    /// Module or node not present in the schema database.
    #[error("schema lookup failed for {what}: {reason}")]
    SchemaLookup { what: String, reason: String },

    /// The resolved node exists but is not a table.
    #[error("{name} ({oid}) is not a table, it is a {kind}")]
    NotATable {
        name: String,
        oid: Oid,
        kind: &'static str,
    },

    /// The table's row has zero or several index elements.
    #[error("row {row} must have exactly one index element, found {count}")]
    MissingIndex { row: String, count: usize },

    /// Connecting to the target or walking the table failed.
    #[error("collection from {target} failed: {reason}")]
    Collection { target: String, reason: String },

    /// The walk was interrupted by the cancellation signal.
    #[error("collection from {target} cancelled")]
    Cancelled { target: String },

    /// A returned OID under the index column does not end in a single
    /// unsigned sub-identifier.
    #[error("cannot extract row index from {oid} (index column {index})")]
    IndexParse { oid: Oid, index: Oid },

    /// A (row, column) cell is absent from the walk result.
    #[error("no value for column {column} at row {row}")]
    MissingCell { column: String, row: u32 },

    /// A value column did not hold a number.
    #[error("metric {key}: value column {column} = {value:?} is not a number")]
    MetricValueParse {
        key: String,
        column: String,
        value: String,
    },

    /// Key collision or template compile failure.
    #[error("metric derivation failed: {0}")]
    FatalDerivation(String),

    /// A column declares a display format this crate does not render.
    #[error("unsupported display format {hint:?} for column {column}")]
    UnresolvedFormat { column: String, hint: String },
}

impl Error {
    pub(crate) fn schema_lookup(what: impl Into<String>, reason: impl ToString) -> Self {
        Error::SchemaLookup {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn collection(target: impl Into<String>, reason: impl ToString) -> Self {
        Error::Collection {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for errors caused by the device or network rather than
    /// by configuration or schema.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Collection { .. } | Error::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = Error::MissingIndex {
            row: "ipNetToMediaEntry".into(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "row ipNetToMediaEntry must have exactly one index element, found 2"
        );

        let err = Error::MetricValueParse {
            key: "interface.ifInOctets.eth0".into(),
            column: "ifInOctets".into(),
            value: String::new(),
        };
        assert!(err.to_string().contains("\"\""));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::collection("192.0.2.1:161", "timeout").is_transient());
        assert!(
            Error::Cancelled {
                target: "192.0.2.1:161".into()
            }
            .is_transient()
        );
        assert!(!Error::FatalDerivation("duplicate key".into()).is_transient());
    }
}
