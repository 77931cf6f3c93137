//! Row/column reconstruction from a flat walk result.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::collector::RawCells;
use crate::error::{Error, Result};
use crate::schema::{ColumnDescriptor, TableSchema};

/// Instance sub-identifier following the index column OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(pub u32);

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table with its rows discovered.
///
/// Rows are in ascending index order, which is the order every consumer
/// iterates in. Cells are looked up on demand from the walk result; the
/// table is assumed dense and a missing cell is an error.
#[derive(Debug, Clone)]
pub struct ReconstructedTable {
    schema: TableSchema,
    cells: RawCells,
    rows: Vec<RowIndex>,
}

impl ReconstructedTable {
    /// Discover rows from the values collected under the index column.
    pub fn build(schema: TableSchema, cells: RawCells) -> Result<Self> {
        let mut rows = BTreeSet::new();

        for (oid, _) in cells.under(&schema.index_oid) {
            match oid.suffix_after(&schema.index_oid) {
                // the index column object itself, not an instance
                Some([]) => continue,
                Some(&[index]) => {
                    rows.insert(RowIndex(index));
                }
                _ => {
                    return Err(Error::IndexParse {
                        oid: oid.clone(),
                        index: schema.index_oid.clone(),
                    });
                }
            }
        }

        let rows: Vec<RowIndex> = rows.into_iter().collect();
        debug!(
            target: "snmp_table::table",
            index = %schema.index_oid,
            rows = rows.len(),
            "rows reconstructed"
        );

        Ok(Self {
            schema,
            cells,
            rows,
        })
    }

    pub fn rows(&self) -> &[RowIndex] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.schema.columns
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Value of `column` at `row`.
    pub fn cell(&self, row: RowIndex, column: &ColumnDescriptor) -> Result<&str> {
        self.cells
            .get(&column.oid.child(row.0))
            .ok_or_else(|| Error::MissingCell {
                column: column.name.clone(),
                row: row.0,
            })
    }

    /// Every column of `row`, in column order.
    pub fn row(&self, row: RowIndex) -> Result<Vec<(&ColumnDescriptor, &str)>> {
        self.schema
            .columns
            .iter()
            .map(|column| Ok((column, self.cell(row, column)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::Oid;

    fn schema() -> TableSchema {
        TableSchema {
            root_oid: Oid::parse("1.3.6.1.2.1.2.2").unwrap(),
            index_oid: Oid::parse("1.3.6.1.2.1.2.2.1.1").unwrap(),
            columns: vec![
                ColumnDescriptor {
                    name: "ifIndex".into(),
                    oid: Oid::parse("1.3.6.1.2.1.2.2.1.1").unwrap(),
                    format_hint: None,
                },
                ColumnDescriptor {
                    name: "ifDescr".into(),
                    oid: Oid::parse("1.3.6.1.2.1.2.2.1.2").unwrap(),
                    format_hint: Some("255a".into()),
                },
            ],
        }
    }

    fn cells(entries: &[(&str, &str)]) -> RawCells {
        entries
            .iter()
            .map(|(oid, v)| (Oid::parse(oid).unwrap(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_interfaces_scenario() {
        let table = ReconstructedTable::build(
            schema(),
            cells(&[
                (".1.3.6.1.2.1.2.2.1.1.1", "1"),
                (".1.3.6.1.2.1.2.2.1.2.1", "eth0"),
                (".1.3.6.1.2.1.2.2.1.1.2", "2"),
                (".1.3.6.1.2.1.2.2.1.2.2", "eth1"),
            ]),
        )
        .unwrap();

        assert_eq!(table.rows(), &[RowIndex(1), RowIndex(2)]);
        let descr = &table.columns()[1];
        assert_eq!(table.cell(RowIndex(1), descr).unwrap(), "eth0");
        assert_eq!(table.cell(RowIndex(2), descr).unwrap(), "eth1");
    }

    #[test]
    fn test_rows_sorted_numerically() {
        let table = ReconstructedTable::build(
            schema(),
            cells(&[
                ("1.3.6.1.2.1.2.2.1.1.10", "10"),
                ("1.3.6.1.2.1.2.2.1.1.9", "9"),
                ("1.3.6.1.2.1.2.2.1.1.100", "100"),
            ]),
        )
        .unwrap();
        assert_eq!(table.rows(), &[RowIndex(9), RowIndex(10), RowIndex(100)]);
    }

    #[test]
    fn test_rows_only_from_index_column() {
        // a neighbouring column with a longer common string prefix adds no rows
        let mut s = schema();
        s.columns.push(ColumnDescriptor {
            name: "ifInOctets".into(),
            oid: Oid::parse("1.3.6.1.2.1.2.2.1.10").unwrap(),
            format_hint: None,
        });
        let table = ReconstructedTable::build(
            s,
            cells(&[
                ("1.3.6.1.2.1.2.2.1.1.4", "4"),
                ("1.3.6.1.2.1.2.2.1.10.4", "1000"),
                ("1.3.6.1.2.1.2.2.1.10.5", "2000"),
            ]),
        )
        .unwrap();
        assert_eq!(table.rows(), &[RowIndex(4)]);
    }

    #[test]
    fn test_multi_arc_suffix_is_index_parse_error() {
        let err = ReconstructedTable::build(
            schema(),
            cells(&[("1.3.6.1.2.1.2.2.1.1.192.0.2.1", "x")]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::IndexParse { .. }));
    }

    #[test]
    fn test_missing_cell() {
        let table = ReconstructedTable::build(
            schema(),
            cells(&[
                ("1.3.6.1.2.1.2.2.1.1.1", "1"),
                ("1.3.6.1.2.1.2.2.1.1.2", "2"),
                ("1.3.6.1.2.1.2.2.1.2.1", "eth0"),
            ]),
        )
        .unwrap();
        let descr = &table.columns()[1];
        let err = table.cell(RowIndex(2), descr).unwrap_err();
        assert!(matches!(err, Error::MissingCell { row: 2, .. }));
        assert!(table.row(RowIndex(2)).is_err());
        assert_eq!(table.row(RowIndex(1)).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_walk_has_no_rows() {
        let table = ReconstructedTable::build(schema(), RawCells::new()).unwrap();
        assert!(table.rows().is_empty());
    }
}
