//! Owned protocol values.
//!
//! `snmp2` hands out values borrowing the session's receive buffer; the walk
//! converts each one into [`Value`] before the next request reuses it.

use std::net::Ipv4Addr;

use super::Oid;

/// SNMP value with its protocol type preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    /// Gauge32 / Unsigned32 share a tag.
    Unsigned32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Anything else the wire crate can decode but a table cell never holds.
    Other(&'static str),
}

impl Value {
    /// Protocol type name, for logs and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::OctetString(_) => "OCTET STRING",
            Value::Null => "NULL",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Value::IpAddress(_) => "IpAddress",
            Value::Counter32(_) => "Counter32",
            Value::Unsigned32(_) => "Gauge32",
            Value::TimeTicks(_) => "TimeTicks",
            Value::Opaque(_) => "Opaque",
            Value::Counter64(_) => "Counter64",
            Value::NoSuchObject => "noSuchObject",
            Value::NoSuchInstance => "noSuchInstance",
            Value::EndOfMibView => "endOfMibView",
            Value::Other(name) => name,
        }
    }

    /// Integer and counter types rendered in base 10.
    ///
    /// ```
    /// use snmp_table::snmp::Value;
    ///
    /// assert_eq!(Value::Counter64(u64::MAX).as_decimal().as_deref(), Some("18446744073709551615"));
    /// assert_eq!(Value::Integer(-3).as_decimal().as_deref(), Some("-3"));
    /// assert_eq!(Value::OctetString(b"1".to_vec()).as_decimal(), None);
    /// ```
    pub fn as_decimal(&self) -> Option<String> {
        match self {
            Value::Integer(v) => Some(v.to_string()),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::TimeTicks(v) => {
                Some(v.to_string())
            }
            Value::Counter64(v) => Some(v.to_string()),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(octets) => Some(Ipv4Addr::from(*octets)),
            _ => None,
        }
    }

    /// `noSuchObject`, `noSuchInstance` and `endOfMibView`.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }
}

/// OID/value pair as returned by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }
}
