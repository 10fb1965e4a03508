use std::collections::HashMap;
use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Path of the libSQL database file; `:memory:` is accepted for tests.
    pub db_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "FIELDPULSE_API_BIND_ADDR", "127.0.0.1:8080");
        let db_path = value_or_default(&lookup, "FIELDPULSE_DB_PATH", "fieldpulse.db");
        if db_path.is_empty() {
            return Err(ConfigError::Invalid(
                "FIELDPULSE_DB_PATH must not be empty".to_string(),
            ));
        }
        Ok(Self { bind_addr, db_path })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn config_uses_defaults_when_unset() {
        let map: HashMap<&str, &str> = HashMap::new();
        let config =
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.db_path, "fieldpulse.db");
    }

    #[test]
    fn config_reads_overrides() {
        let mut map = HashMap::new();
        map.insert("FIELDPULSE_API_BIND_ADDR", "0.0.0.0:9000");
        map.insert("FIELDPULSE_DB_PATH", "/var/lib/fieldpulse/db.sqlite");
        let config =
            AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string())).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.db_path, "/var/lib/fieldpulse/db.sqlite");
    }
}
