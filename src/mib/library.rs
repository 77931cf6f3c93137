use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::{MibNode, MibSource};
use crate::error::{Error, Result};
use crate::snmp::Oid;

/// File extensions tried for a module, in order.
const DUMP_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Pre-compiled module: the module name and its object registrations.
///
/// ```yaml
/// module: IF-MIB
/// nodes:
///   - { name: ifTable, oid: 1.3.6.1.2.1.2.2, kind: table }
///   - { name: ifEntry, oid: 1.3.6.1.2.1.2.2.1, kind: row, index: [ifIndex] }
///   - { name: ifIndex, oid: 1.3.6.1.2.1.2.2.1.1, kind: column }
///   - { name: ifPhysAddress, oid: 1.3.6.1.2.1.2.2.1.6, kind: column, format: "1x:" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDump {
    pub module: String,
    #[serde(default)]
    pub nodes: Vec<MibNode>,
}

impl ModuleDump {
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yml::from_str(source).map_err(|e| Error::schema_lookup("module dump", e))
    }

    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| Error::schema_lookup("module dump", e))
    }
}

/// Loaded modules, indexed by OID.
///
/// Opened at the start of a poll cycle and dropped at its end; the value
/// owns everything it loaded.
#[derive(Debug, Default)]
pub struct MibLibrary {
    modules: Vec<ModuleDump>,
    by_oid: BTreeMap<Oid, (usize, usize)>,
}

impl MibLibrary {
    /// Загружает `modules` из первого пути поиска, где найден дамп модуля.
    pub fn open<P: AsRef<Path>>(modules: &[String], search_paths: &[P]) -> Result<Self> {
        let mut library = Self::default();
        for name in modules {
            let path = find_dump(name, search_paths).ok_or_else(|| {
                Error::schema_lookup(format!("module {name}"), "no dump found in search paths")
            })?;
            let dump = read_dump(&path)?;
            if dump.module != *name {
                warn!(
                    target: "snmp_table::mib",
                    requested = %name,
                    declared = %dump.module,
                    path = %path.display(),
                    "module dump declares a different name"
                );
            }
            debug!(
                target: "snmp_table::mib",
                module = %dump.module,
                nodes = dump.nodes.len(),
                path = %path.display(),
                "module loaded"
            );
            library.insert(dump);
        }
        Ok(library)
    }

    /// Add a module. A node whose OID is already registered by an earlier
    /// module is kept reachable by name only.
    pub fn insert(&mut self, dump: ModuleDump) {
        let module_idx = self.modules.len();
        for (node_idx, node) in dump.nodes.iter().enumerate() {
            if self.by_oid.contains_key(&node.oid) {
                debug!(
                    target: "snmp_table::mib",
                    oid = %node.oid,
                    name = %node.name,
                    "OID already registered, keeping first definition"
                );
                continue;
            }
            self.by_oid.insert(node.oid.clone(), (module_idx, node_idx));
        }
        self.modules.push(dump);
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.module.as_str())
    }

    fn module(&self, name: &str) -> Option<&ModuleDump> {
        self.modules.iter().find(|m| m.module == name)
    }

    fn node_at(&self, (module_idx, node_idx): (usize, usize)) -> &MibNode {
        &self.modules[module_idx].nodes[node_idx]
    }

    /// Module owning the node registered at `oid`.
    fn owner_of(&self, oid: &Oid) -> Option<&ModuleDump> {
        self.by_oid
            .get(oid)
            .map(|&(module_idx, _)| &self.modules[module_idx])
    }
}

impl MibSource for MibLibrary {
    fn node_by_oid(&self, oid: &Oid) -> Result<&MibNode> {
        self.by_oid
            .get(oid)
            .map(|&at| self.node_at(at))
            .ok_or_else(|| Error::schema_lookup(format!("OID {oid}"), "no such node"))
    }

    fn node_by_name(&self, module: &str, name: &str) -> Result<&MibNode> {
        let dump = self
            .module(module)
            .ok_or_else(|| Error::schema_lookup(format!("module {module}"), "not loaded"))?;
        dump.nodes
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| Error::schema_lookup(format!("{module}::{name}"), "no such node"))
    }

    fn subtree(&self, root: &MibNode) -> Vec<&MibNode> {
        self.by_oid
            .range(root.oid.clone()..)
            .take_while(|(oid, _)| oid.starts_with(&root.oid))
            .map(|(_, &at)| self.node_at(at))
            .collect()
    }

    fn index_of(&self, row: &MibNode) -> Result<Vec<&MibNode>> {
        let home = self.owner_of(&row.oid);
        row.index
            .iter()
            .map(|name| {
                home.and_then(|m| m.nodes.iter().find(|n| n.name == *name))
                    .or_else(|| {
                        self.modules
                            .iter()
                            .flat_map(|m| m.nodes.iter())
                            .find(|n| n.name == *name)
                    })
                    .ok_or_else(|| {
                        Error::schema_lookup(
                            format!("index {name} of {}", row.name),
                            "not defined in any loaded module",
                        )
                    })
            })
            .collect()
    }
}

fn find_dump<P: AsRef<Path>>(module: &str, search_paths: &[P]) -> Option<PathBuf> {
    search_paths.iter().find_map(|dir| {
        DUMP_EXTENSIONS
            .iter()
            .map(|ext| dir.as_ref().join(format!("{module}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}

fn read_dump(path: &Path) -> Result<ModuleDump> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::schema_lookup(format!("file {}", path.display()), e))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => ModuleDump::from_json(&source),
        _ => ModuleDump::from_yaml(&source),
    }
}
