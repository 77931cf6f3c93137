use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::snmp::Oid;

/// Flat walk result: full instance OID to decoded value.
///
/// Immutable once collection finishes. Iteration is in OID order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCells {
    cells: BTreeMap<Oid, String>,
}

impl RawCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, refusing to overwrite one already collected for the
    /// same OID. Returns `false` on a duplicate.
    pub fn insert_unique(&mut self, oid: Oid, value: String) -> bool {
        match self.cells.entry(oid) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, oid: &Oid) -> Option<&str> {
        self.cells.get(oid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Entries under `prefix`, in OID order.
    pub fn under<'a>(&'a self, prefix: &'a Oid) -> impl Iterator<Item = (&'a Oid, &'a str)> + 'a {
        self.cells
            .range(prefix.clone()..)
            .take_while(move |(oid, _)| oid.starts_with(prefix))
            .map(|(oid, value)| (oid, value.as_str()))
    }
}

impl FromIterator<(Oid, String)> for RawCells {
    /// Later duplicates replace earlier ones; use [`RawCells::insert_unique`]
    /// where duplicates must be detected.
    fn from_iter<I: IntoIterator<Item = (Oid, String)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
