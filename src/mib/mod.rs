//! Schema database capability.
//!
//! The resolver only needs node lookups and subtree traversal; [`MibSource`]
//! is that surface. [`MibLibrary`] implements it over pre-compiled module
//! dumps so no SMI parsing happens here.

use serde::Deserialize;

use crate::error::Result;
use crate::snmp::Oid;

pub mod library;

pub use library::MibLibrary;

/// Node classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Table,
    Row,
    Column,
    Scalar,
    /// Any other registration (module identity, object group, branch).
    #[serde(other)]
    Node,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Table => "table",
            NodeKind::Row => "row",
            NodeKind::Column => "column",
            NodeKind::Scalar => "scalar",
            NodeKind::Node => "node",
        }
    }
}

/// One registered object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MibNode {
    pub name: String,
    pub oid: Oid,
    pub kind: NodeKind,
    /// INDEX clause of a row, as object names.
    #[serde(default)]
    pub index: Vec<String>,
    /// DISPLAY-HINT of the object's syntax, when it has one.
    #[serde(default)]
    pub format: Option<String>,
}

/// Read-only view of a loaded schema.
pub trait MibSource {
    /// Node registered at exactly `oid`.
    fn node_by_oid(&self, oid: &Oid) -> Result<&MibNode>;

    /// Node called `name` inside `module`.
    fn node_by_name(&self, module: &str, name: &str) -> Result<&MibNode>;

    /// `root` and every node below it, in ascending OID order.
    fn subtree(&self, root: &MibNode) -> Vec<&MibNode>;

    /// Index elements of a row node, resolved to their nodes.
    fn index_of(&self, row: &MibNode) -> Result<Vec<&MibNode>>;
}
