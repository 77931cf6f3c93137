use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod settings;

pub use settings::{MibSettings, TargetSettings};

use crate::metrics::MetricSpec;

pub const DEFAULT_METRIC_PREFIX: &str = "snmp-table";

/// Главная конфигурация плагина
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mib: MibSettings,
    pub target: TargetSettings,
    #[serde(rename = "metric", default)]
    pub metrics: Vec<MetricSpec>,
    /// Общий префикс ключей метрик
    #[serde(default)]
    pub prefix: String,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла, применяет переменные окружения и проверяет её
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл конфигурации: {}", path.display()))?;

        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Некорректный файл конфигурации: {}", path.display()))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yml::from_str(content).context("Не удалось распарсить YAML")?;
        Ok(config)
    }

    /// `SNMP_TARGET`, `SNMP_COMMUNITY` and `SNMP_TIMEOUT` replace the file values
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(target) = lookup("SNMP_TARGET").filter(|v| !v.is_empty()) {
            self.target.ipaddress = target;
        }
        if let Some(community) = lookup("SNMP_COMMUNITY") {
            self.target.community = community;
        }
        if let Some(timeout) = lookup("SNMP_TIMEOUT").and_then(|s| s.parse().ok()) {
            self.target.timeout = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.ipaddress.trim().is_empty() {
            anyhow::bail!("target.ipaddress пустой");
        }
        if self.target.oid.trim().is_empty() {
            anyhow::bail!("target.oid пустой");
        }
        if self.target.timeout == 0 {
            anyhow::bail!("target.timeout должен быть не меньше секунды");
        }
        if self.metrics.is_empty() {
            anyhow::bail!("Не задано ни одной метрики");
        }
        for (i, metric) in self.metrics.iter().enumerate() {
            if metric.key.trim().is_empty() {
                anyhow::bail!("metric[{}]: пустой key", i);
            }
            if metric.values.is_empty() {
                anyhow::bail!("metric[{}] ({}): не задано ни одного value", i, metric.key);
            }
            if let Some(v) = metric.values.iter().find(|v| v.name.trim().is_empty()) {
                anyhow::bail!("metric[{}] ({}): value с пустым name (label {:?})", i, metric.key, v.label);
            }
        }
        Ok(())
    }

    /// Префикс всех выводимых ключей
    pub fn metric_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            DEFAULT_METRIC_PREFIX
        } else {
            &self.prefix
        }
    }

    pub fn community(&self) -> Vec<u8> {
        self.target.community.clone().into_bytes()
    }
}
