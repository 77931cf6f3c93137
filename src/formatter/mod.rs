pub mod plugin;
pub mod preview;
pub mod state;

pub use plugin::PluginFormatter;
pub use preview::render_table;
pub use state::CounterState;
