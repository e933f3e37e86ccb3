// ⚙️ Configuration - Environment-driven settings for the binary
//
// FINANCE_DB_PATH   database file (":memory:" for a throwaway store)
// FINANCE_CYCLE_TZ  calendar for cycle keys: local | utc | +HH:MM
// FINANCE_LOG       tracing filter directive

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::cycle::CycleZone;

pub const ENV_DB_PATH: &str = "FINANCE_DB_PATH";
pub const ENV_CYCLE_TZ: &str = "FINANCE_CYCLE_TZ";
pub const ENV_LOG: &str = "FINANCE_LOG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    #[serde(with = "zone_string")]
    pub cycle_zone: CycleZone,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("finance.db"),
            cycle_zone: CycleZone::Local,
            log_filter: "finance_tracker=info".to_string(),
        }
    }
}

impl Config {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Read settings from explicit name/value pairs; unknown names are ignored
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Config::default();

        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                ENV_DB_PATH if !value.is_empty() => config.database_path = PathBuf::from(value),
                ENV_CYCLE_TZ if !value.is_empty() => {
                    config.cycle_zone = value
                        .parse()
                        .with_context(|| format!("invalid {}", ENV_CYCLE_TZ))?;
                }
                ENV_LOG if !value.is_empty() => config.log_filter = value,
                _ => {}
            }
        }

        Ok(config)
    }

    /// Parse a JSON settings document; missing keys take defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid configuration JSON")
    }
}

mod zone_string {
    use super::CycleZone;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CycleZone, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_defaults_without_vars() {
        let config = Config::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database_path, PathBuf::from("finance.db"));
        assert_eq!(config.cycle_zone, CycleZone::Local);
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = Config::from_vars([
            (ENV_DB_PATH, ":memory:"),
            (ENV_CYCLE_TZ, "+05:30"),
            (ENV_LOG, "finance_tracker=debug"),
            ("HOME", "/root"),
        ])
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from(":memory:"));
        assert_eq!(
            config.cycle_zone,
            CycleZone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!(config.log_filter, "finance_tracker=debug");
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = Config::from_vars([(ENV_DB_PATH, ""), (ENV_CYCLE_TZ, "")]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bad_zone_names_the_variable() {
        let err = Config::from_vars([(ENV_CYCLE_TZ, "Mars/Olympus")]).unwrap_err();
        assert!(err.to_string().contains(ENV_CYCLE_TZ));
    }

    #[test]
    fn test_from_json() {
        let config = Config::from_json(r#"{"cycle_zone": "utc", "database_path": "/tmp/f.db"}"#).unwrap();
        assert_eq!(config.cycle_zone, CycleZone::Utc);
        assert_eq!(config.database_path, PathBuf::from("/tmp/f.db"));
        assert_eq!(config.log_filter, "finance_tracker=info");

        assert!(Config::from_json(r#"{"cycle_zone": "nowhere"}"#).is_err());
    }
}
