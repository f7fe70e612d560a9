//! Server configuration from environment variables
//!
//! - `MODEL_DIR`: directory with `season_encoder.json` + `zone_classifier.json` (default `models`)
//! - `PORT`: listen port (default 3000)
//! - `HISTORY_PATH`: SQLite database for prediction records (default: in memory)
//! - `HISTORY_CAPACITY`: records kept in memory when `HISTORY_PATH` is unset (default 1000)
//! - `OUT_OF_BOUNDS_GPS`: `fallback` or `reject` (default `fallback`)

use crate::history::DEFAULT_MEMORY_CAPACITY;
use crate::request::GpsPolicy;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub model_dir: PathBuf,
    pub port: u16,
    pub history_path: Option<PathBuf>,
    pub history_capacity: usize,
    pub gps_policy: GpsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            port: 3000,
            history_path: None,
            history_capacity: DEFAULT_MEMORY_CAPACITY,
            gps_policy: GpsPolicy::Fallback,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get("MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {}", port))?;
        }

        config.history_path = get("HISTORY_PATH").map(PathBuf::from);

        if let Some(capacity) = get("HISTORY_CAPACITY") {
            config.history_capacity = capacity
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid HISTORY_CAPACITY: {}", capacity))?;
        }

        if let Some(policy) = get("OUT_OF_BOUNDS_GPS") {
            config.gps_policy = policy
                .parse::<GpsPolicy>()
                .with_context(|| "Invalid OUT_OF_BOUNDS_GPS")?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MODEL_DIR", "/opt/fishzone/models"),
            ("PORT", "8080"),
            ("HISTORY_PATH", "/var/lib/fishzone/history.db"),
            ("HISTORY_CAPACITY", "250"),
            ("OUT_OF_BOUNDS_GPS", "reject"),
        ]))
        .unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/opt/fishzone/models"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_path, Some(PathBuf::from("/var/lib/fishzone/history.db")));
        assert_eq!(config.history_capacity, 250);
        assert_eq!(config.gps_policy, GpsPolicy::Reject);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("OUT_OF_BOUNDS_GPS", "drop")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("HISTORY_CAPACITY", "-1")])).is_err());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("HISTORY_PATH", ""), ("PORT", " ")])).unwrap();
        assert_eq!(config.history_path, None);
        assert_eq!(config.port, 3000);
    }
}
