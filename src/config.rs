// src/config.rs
use crate::ledger::DEFAULT_HISTORY_CAPACITY;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name} value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub history_capacity: usize,
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = parse_var(&lookup, "STOCK_DASHBOARD_ADDR")?
            .unwrap_or_else(|| Config::default().addr);
        let history_capacity =
            parse_var(&lookup, "STOCK_DASHBOARD_HISTORY")?.unwrap_or(DEFAULT_HISTORY_CAPACITY);
        if history_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "STOCK_DASHBOARD_HISTORY",
                value: "0".to_string(),
                reason: "capacity must be at least 1".to_string(),
            });
        }
        let seed = parse_var(&lookup, "STOCK_DASHBOARD_SEED")?;
        Ok(Config {
            addr,
            history_capacity,
            seed,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            seed: None,
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr.to_string(), "127.0.0.1:3030");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOCK_DASHBOARD_ADDR", "0.0.0.0:8080"),
            ("STOCK_DASHBOARD_HISTORY", "25"),
            ("STOCK_DASHBOARD_SEED", "42"),
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.history_capacity, 25);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("STOCK_DASHBOARD_ADDR", "localhost")]).is_err());
        assert!(load(&[("STOCK_DASHBOARD_HISTORY", "0")]).is_err());
        assert!(load(&[("STOCK_DASHBOARD_SEED", "-1")]).is_err());
    }
}
