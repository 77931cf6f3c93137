use comfy_table::{ContentArrangement, Table, presets};

use crate::error::Result;
use crate::table::ReconstructedTable;

/// Render the reconstructed table: one header cell per column, one line per
/// row in ascending index order.
pub fn render_table(table: &ReconstructedTable) -> Result<Table> {
    let mut out = Table::new();
    out.load_preset(presets::ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(table.columns().iter().map(|c| c.name.as_str()));

    for &row in table.rows() {
        let cells = table
            .row(row)?
            .into_iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>();
        out.add_row(cells);
    }
    Ok(out)
}
