//! Poll one SNMP table, rebuild its rows from the MIB schema and derive
//! named metrics from configurable key templates.

pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod metrics;
pub mod mib;
pub mod pipeline;
pub mod schema;
pub mod snmp;
pub mod table;

pub use error::{Error, Result};
