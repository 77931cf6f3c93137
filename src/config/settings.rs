use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snmp::SessionOptions;

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_MAX_REPETITIONS: u32 = 10;

/// Где искать дампы MIB модулей и какие загружать
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MibSettings {
    /// Пути поиска, в порядке приоритета
    #[serde(default)]
    pub directory: Vec<PathBuf>,
    #[serde(default)]
    pub modules: Vec<String>,
}

/// Опрашиваемый агент и таблица
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Host or `host:port`
    pub ipaddress: String,
    #[serde(default = "default_community")]
    pub community: String,
    /// Numeric OID or `MODULE::table`
    pub oid: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Таймаут для SNMP операций (секунды)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: u32,
}

impl TargetSettings {
    /// `host:port` for the session. A port in `ipaddress` wins over `port`.
    pub fn address(&self) -> String {
        let host = self.ipaddress.trim();
        if host.parse::<SocketAddr>().is_ok() {
            return host.to_string();
        }
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{v6}]:{}", self.port),
            Ok(IpAddr::V4(v4)) => format!("{v4}:{}", self.port),
            Err(_) if host.contains(':') => host.to_string(),
            Err(_) => format!("{host}:{}", self.port),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeout: Duration::from_secs(self.timeout),
            retries: self.retries,
            max_repetitions: self.max_repetitions,
        }
    }
}

fn default_community() -> String {
    "public".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_max_repetitions() -> u32 {
    DEFAULT_MAX_REPETITIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ipaddress: &str) -> TargetSettings {
        TargetSettings {
            ipaddress: ipaddress.to_string(),
            community: default_community(),
            oid: "IF-MIB::ifTable".to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
        }
    }

    #[test]
    fn test_address_forms() {
        assert_eq!(target("192.0.2.1").address(), "192.0.2.1:161");
        assert_eq!(target("192.0.2.1:1161").address(), "192.0.2.1:1161");
        assert_eq!(target("switch01").address(), "switch01:161");
        assert_eq!(target("switch01:1161").address(), "switch01:1161");
        assert_eq!(target("2001:db8::1").address(), "[2001:db8::1]:161");
        assert_eq!(target("[2001:db8::1]:1161").address(), "[2001:db8::1]:1161");
    }

    #[test]
    fn test_session_options() {
        let mut t = target("192.0.2.1");
        t.timeout = 2;
        t.retries = 1;
        let opts = t.session_options();
        assert_eq!(opts.timeout, Duration::from_secs(2));
        assert_eq!(opts.retries, 1);
        assert_eq!(opts.max_repetitions, DEFAULT_MAX_REPETITIONS);
    }
}
