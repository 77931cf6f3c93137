//! Metric derivation: reconstructed table + metric specs -> keyed values.

pub mod context;
pub mod template;

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::table::ReconstructedTable;

pub use context::{FieldId, FieldSet, METRIC_VALUE, SubstitutionContext};
pub use template::Template;

pub const DEFAULT_UNIT: &str = "float";

/// One metric family.
///
/// Keys are `prefix + "." + key`, rendered per row and per value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricSpec {
    #[serde(default)]
    pub prefix: String,
    pub key: String,
    #[serde(rename = "value", default)]
    pub values: Vec<MetricValueSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricValueSpec {
    /// Column whose cell holds the number.
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "diff", default)]
    pub is_counter: bool,
}

impl MetricValueSpec {
    pub fn unit(&self) -> &str {
        match self.unit.as_deref() {
            Some(unit) if !unit.is_empty() => unit,
            _ => DEFAULT_UNIT,
        }
    }
}

/// Presentation metadata for one configured value, independent of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDefinition {
    pub metric_key_prefix: String,
    pub display_label: String,
    pub unit: String,
    pub is_counter: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    pub metrics: BTreeMap<String, f64>,
    /// Keys produced by `diff` values; the sink reports their rate.
    pub counters: BTreeSet<String>,
    pub graphs: Vec<GraphDefinition>,
}

impl DerivedMetrics {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn is_counter(&self, key: &str) -> bool {
        self.counters.contains(key)
    }
}

/// Evaluate every spec against every row.
///
/// Any failure aborts the whole derivation; there is no partial result.
pub fn derive(table: &ReconstructedTable, specs: &[MetricSpec]) -> Result<DerivedMetrics> {
    let table_fields = FieldSet::for_table(table.schema());
    let mut out = DerivedMetrics {
        graphs: graph_definitions(specs)?,
        ..Default::default()
    };

    for spec in specs {
        let key_template = Template::compile(&format!("{}.{}", spec.prefix, spec.key), &table_fields)?;

        for &row in table.rows() {
            let mut ctx = SubstitutionContext::new(&table_fields);
            for (column, value) in table.row(row)? {
                ctx.bind_column(&column.name, value);
            }

            for value in &spec.values {
                ctx.bind_metric_value(&value.name);
                let key = key_template.render(&ctx)?;
                let number = parse_value(&key, &value.name, ctx.column(&value.name))?;

                match out.metrics.entry(key) {
                    Entry::Vacant(slot) => {
                        if value.is_counter {
                            out.counters.insert(slot.key().clone());
                        }
                        slot.insert(number);
                    }
                    Entry::Occupied(slot) => {
                        return Err(Error::FatalDerivation(format!(
                            "metric key {:?} produced twice (template {:?}, row {row}, value {:?})",
                            slot.key(),
                            key_template.source(),
                            value.name
                        )));
                    }
                }
            }
        }
    }

    debug!(
        target: "snmp_table::metrics",
        rows = table.rows().len(),
        metrics = out.metrics.len(),
        graphs = out.graphs.len(),
        "metrics derived"
    );
    Ok(out)
}

/// Graph metadata for every configured value. Needs no table: prefix
/// templates may only reference [`METRIC_VALUE`].
pub fn graph_definitions(specs: &[MetricSpec]) -> Result<Vec<GraphDefinition>> {
    let fields = FieldSet::metric_value_only();
    let mut graphs: Vec<GraphDefinition> = Vec::new();

    for spec in specs {
        let prefix = Template::compile(&spec.prefix, &fields)?;
        for value in &spec.values {
            let mut ctx = SubstitutionContext::new(&fields);
            ctx.bind_metric_value(&value.name);
            let metric_key_prefix = prefix.render(&ctx)?;

            if graphs.iter().any(|g| g.metric_key_prefix == metric_key_prefix) {
                warn!(
                    target: "snmp_table::metrics",
                    prefix = %metric_key_prefix,
                    "graph prefix defined more than once, last definition wins"
                );
                graphs.retain(|g| g.metric_key_prefix != metric_key_prefix);
            }
            graphs.push(GraphDefinition {
                metric_key_prefix,
                display_label: value.label.clone(),
                unit: value.unit().to_string(),
                is_counter: value.is_counter,
            });
        }
    }
    Ok(graphs)
}

fn parse_value(key: &str, column: &str, raw: Option<&str>) -> Result<f64> {
    let raw = raw.unwrap_or_default();
    raw.parse::<f64>().map_err(|_| Error::MetricValueParse {
        key: key.to_string(),
        column: column.to_string(),
        value: raw.to_string(),
    })
}
