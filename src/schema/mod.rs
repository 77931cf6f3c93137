//! Table schema resolution.
//!
//! Turns a table identifier into the root OID, the single index column and
//! the data columns of the table, using a [`MibSource`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::mib::{MibNode, MibSource, NodeKind};
use crate::snmp::Oid;

/// A conceptual column of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub oid: Oid,
    pub format_hint: Option<String>,
}

impl ColumnDescriptor {
    /// Last arc of the column OID, used only for ordering.
    pub fn sub_id(&self) -> u32 {
        self.oid.last_arc().unwrap_or_default()
    }
}

/// Structure of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub root_oid: Oid,
    pub index_oid: Oid,
    /// Ordered by sub-identifier, unique by OID.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// Column whose OID prefixes `oid`.
    pub fn column_for(&self, oid: &Oid) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| oid.starts_with(&c.oid))
    }

    pub fn column_named(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// How a table was named in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIdentifier {
    Numeric(Oid),
    Symbolic { module: String, name: String },
}

impl TableIdentifier {
    /// Numeric form starts with a digit or a dot, symbolic form is
    /// `MODULE::name`.
    pub fn parse(identifier: &str) -> Result<Self> {
        let invalid = || Error::InvalidIdentifier {
            identifier: identifier.to_string(),
        };

        let first = identifier.chars().next().ok_or_else(invalid)?;
        if first.is_ascii_digit() || first == '.' {
            return Oid::parse(identifier).map(TableIdentifier::Numeric);
        }

        match identifier.split_once("::") {
            Some((module, name)) if !module.is_empty() && !name.is_empty() => {
                Ok(TableIdentifier::Symbolic {
                    module: module.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// Resolve `identifier` to the schema of the table it names.
pub fn resolve_table<M: MibSource>(mib: &M, identifier: &str) -> Result<TableSchema> {
    let node = match TableIdentifier::parse(identifier)? {
        TableIdentifier::Numeric(oid) => mib.node_by_oid(&oid)?,
        TableIdentifier::Symbolic { module, name } => mib.node_by_name(&module, &name)?,
    };

    if node.kind != NodeKind::Table {
        return Err(Error::NotATable {
            name: node.name.clone(),
            oid: node.oid.clone(),
            kind: node.kind.as_str(),
        });
    }

    let subtree = mib.subtree(node);

    let row = subtree
        .iter()
        .find(|n| n.kind == NodeKind::Row)
        .ok_or_else(|| Error::MissingIndex {
            row: format!("{} (no row)", node.name),
            count: 0,
        })?;
    let index_oid = single_index(mib, row)?;

    let mut columns: Vec<ColumnDescriptor> = subtree
        .iter()
        .filter(|n| n.kind == NodeKind::Column)
        .map(|n| ColumnDescriptor {
            name: n.name.clone(),
            oid: n.oid.clone(),
            format_hint: n.format.clone(),
        })
        .collect();
    columns.sort_by(|a, b| a.sub_id().cmp(&b.sub_id()).then_with(|| a.oid.cmp(&b.oid)));
    columns.dedup_by(|a, b| a.oid == b.oid);

    debug!(
        target: "snmp_table::schema",
        table = %node.name,
        root = %node.oid,
        index = %index_oid,
        columns = columns.len(),
        "table resolved"
    );

    Ok(TableSchema {
        root_oid: node.oid.clone(),
        index_oid,
        columns,
    })
}

fn single_index<M: MibSource>(mib: &M, row: &MibNode) -> Result<Oid> {
    let index = mib.index_of(row)?;
    match index.as_slice() {
        [only] => Ok(only.oid.clone()),
        other => Err(Error::MissingIndex {
            row: row.name.clone(),
            count: other.len(),
        }),
    }
}
