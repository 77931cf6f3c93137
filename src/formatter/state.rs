use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::DerivedMetrics;

/// Overrides the directory holding the counter state file.
pub const WORKDIR_ENV: &str = "MACKEREL_PLUGIN_WORKDIR";

/// Samples further apart than this are not differenced.
pub const MAX_ELAPSED_SECS: i64 = 600;

/// Последние значения счётчиков и время их снятия.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub timestamp: i64,
    pub values: BTreeMap<String, f64>,
}

impl CounterState {
    /// Counter values of one cycle.
    pub fn capture(derived: &DerivedMetrics, timestamp: i64) -> Self {
        let values = derived
            .metrics
            .iter()
            .filter(|(key, value)| derived.is_counter(key) && value.is_finite())
            .map(|(key, &value)| (key.clone(), value))
            .collect();
        Self { timestamp, values }
    }

    /// `<workdir>/mackerel-plugin-<prefix>`, one file per metric prefix.
    pub fn path_for(prefix: &str) -> PathBuf {
        let dir = std::env::var_os(WORKDIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let name = if prefix.is_empty() { "default" } else { prefix };
        dir.join(format!("mackerel-plugin-{name}"))
    }

    /// Previous state, or `None` on the first run. An unreadable file is
    /// treated the same way.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(target: "snmp_table::formatter", path = %path.display(), error = %e, "no previous counter state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(target: "snmp_table::formatter", path = %path.display(), error = %e, "ignoring corrupt counter state");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Не удалось сериализовать состояние счётчиков")?;
        fs::write(path, json)
            .with_context(|| format!("Не удалось записать состояние счётчиков в {}", path.display()))
    }

    /// Per-minute rate of `key` since this state was taken.
    ///
    /// `None` when the key is new, the clock did not advance, the gap is
    /// longer than [`MAX_ELAPSED_SECS`], or the counter went backwards.
    pub fn rate(&self, key: &str, current: f64, now: i64) -> Option<f64> {
        let last = *self.values.get(key)?;
        let elapsed = now - self.timestamp;
        if elapsed <= 0 || elapsed > MAX_ELAPSED_SECS {
            debug!(target: "snmp_table::formatter", %key, elapsed, "sample interval out of range");
            return None;
        }
        if current < last {
            debug!(target: "snmp_table::formatter", %key, last, current, "counter reset");
            return None;
        }
        Some((current - last) * 60.0 / elapsed as f64)
    }
}
