use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::state::CounterState;
use crate::metrics::{DerivedMetrics, GraphDefinition};

/// Environment variable the agent sets when it asks for graph metadata.
pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";
pub const META_HEADER: &str = "# mackerel-agent-plugin";

/// Graph metadata document printed in meta mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMeta {
    pub graphs: BTreeMap<String, GraphJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphJson {
    pub label: String,
    pub unit: String,
    pub metrics: Vec<GraphMetricJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetricJson {
    pub name: String,
    pub label: String,
    pub diff: bool,
}

/// Plugin protocol writer.
///
/// Two outputs exist: tab separated metric lines, or the graph definition
/// document when the agent requests metadata.
pub struct PluginFormatter;

impl PluginFormatter {
    /// `true` when the agent asked for graph definitions instead of values.
    pub fn meta_requested() -> bool {
        std::env::var_os(META_ENV).is_some_and(|v| !v.is_empty())
    }

    /// Write `<prefix>.<key>\t<value>\t<timestamp>` lines in key order.
    ///
    /// Counter keys are reported as a per-minute rate against `previous`;
    /// without a usable previous sample they are left out of this cycle.
    pub fn write_metrics<W: Write>(
        out: &mut W,
        prefix: &str,
        derived: &DerivedMetrics,
        timestamp: i64,
        previous: Option<&CounterState>,
    ) -> io::Result<()> {
        for (key, &value) in &derived.metrics {
            if !value.is_finite() {
                warn!(target: "snmp_table::formatter", %key, %value, "skipping non-finite value");
                continue;
            }
            let value = if derived.is_counter(key) {
                match previous.and_then(|last| last.rate(key, value, timestamp)) {
                    Some(rate) => rate,
                    None => {
                        debug!(target: "snmp_table::formatter", %key, "no rate for counter this cycle");
                        continue;
                    }
                }
            } else {
                value
            };
            writeln!(out, "{}\t{value:.6}\t{timestamp}", join_key(prefix, key))?;
        }
        Ok(())
    }

    pub fn graph_meta(prefix: &str, graphs: &[GraphDefinition]) -> GraphMeta {
        let graphs = graphs
            .iter()
            .map(|g| {
                let json = GraphJson {
                    label: g.display_label.clone(),
                    unit: g.unit.clone(),
                    metrics: vec![GraphMetricJson {
                        name: "*".to_string(),
                        label: "%1".to_string(),
                        diff: g.is_counter,
                    }],
                };
                (join_key(prefix, &g.metric_key_prefix), json)
            })
            .collect();
        GraphMeta { graphs }
    }

    /// Write the header line followed by the compact graph document.
    pub fn write_meta<W: Write>(
        out: &mut W,
        prefix: &str,
        graphs: &[GraphDefinition],
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(&Self::graph_meta(prefix, graphs))
            .map_err(|e| anyhow::anyhow!("Не удалось сериализовать описание графиков: {}", e))?;
        writeln!(out, "{META_HEADER}")?;
        writeln!(out, "{json}")?;
        Ok(())
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{key}"),
    }
}
