//! Shared test infrastructure: a scripted bulk walker, a UDP agent and
//! IF-MIB fixtures.

#![allow(dead_code)]

pub mod agent;
pub mod fixtures;

use snmp_table::Result;
use snmp_table::snmp::{BulkWalker, Oid, VarBind};

pub use agent::{FakeAgent, Fault};
pub use fixtures::{if_mib, if_table_varbinds, interface_specs};

/// Replays a fixed list of varbinds in the given order.
pub struct ScriptedWalker {
    target: String,
    varbinds: Vec<VarBind>,
    hang: bool,
    pub walks: usize,
}

impl ScriptedWalker {
    pub fn new(varbinds: Vec<VarBind>) -> Self {
        Self {
            target: "192.0.2.1:161".to_string(),
            varbinds,
            hang: false,
            walks: 0,
        }
    }

    /// A walker whose walk never completes, for cancellation tests.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(Vec::new())
        }
    }
}

impl BulkWalker for ScriptedWalker {
    fn target(&self) -> &str {
        &self.target
    }

    async fn bulk_walk<F>(&mut self, root: &Oid, mut on_each: F) -> Result<()>
    where
        F: FnMut(VarBind) -> Result<()>,
    {
        self.walks += 1;
        if self.hang {
            std::future::pending::<()>().await;
        }
        for vb in self.varbinds.iter().filter(|vb| vb.oid.starts_with(root)) {
            on_each(vb.clone())?;
        }
        Ok(())
    }
}
