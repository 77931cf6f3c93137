//! Protocol collection: one bulk walk per table, decoded by column format.

pub mod format;
pub mod table_collector;
pub mod types;

pub use format::DisplayFormat;
pub use table_collector::{TableCollector, cancellable, decode};
pub use types::RawCells;
