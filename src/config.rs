//! Engine configuration.
//!
//! Read from a TOML file when one is given, every field defaulted, then
//! overridden from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::conflicts::ClusterStrategy;

pub const CONFIG_PATH_ENV: &str = "TIMETABLE_CONFIG";
pub const HTTP_ADDR_ENV: &str = "TIMETABLE_HTTP_ADDR";
pub const CLUSTERING_ENV: &str = "TIMETABLE_CLUSTERING";
pub const LOG_ENV: &str = "TIMETABLE_LOG";
pub const DATABASE_ENV: &str = "TIMETABLE_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub clustering: ClusterStrategy,
    /// Run each day's passes on the rayon pool.
    #[serde(default = "default_parallel_days")]
    pub parallel_days: bool,
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// SQLite file backing the HTTP server. Without it the server keeps an
    /// in-memory catalog.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// JSON catalog loaded into the in-memory catalog at startup.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

fn default_parallel_days() -> bool {
    true
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clustering: ClusterStrategy::default(),
            parallel_days: default_parallel_days(),
            http_addr: default_http_addr(),
            log_filter: default_log_filter(),
            database: None,
            snapshot: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// File named by `TIMETABLE_CONFIG` (or defaults), then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps an env var name to its
    /// value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(HTTP_ADDR_ENV) {
            self.http_addr = addr;
        }
        if let Some(value) = lookup(CLUSTERING_ENV) {
            self.clustering = value
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: CLUSTERING_ENV,
                    message,
                })?;
        }
        if let Some(filter) = lookup(LOG_ENV) {
            self.log_filter = filter;
        }
        if let Some(path) = lookup(DATABASE_ENV) {
            self.database = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn file_values_are_read() {
        let config = EngineConfig::from_toml_str(
            r#"
            clustering = "star"
            parallel_days = false
            http_addr = "127.0.0.1:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.clustering, ClusterStrategy::Star);
        assert!(!config.parallel_days);
        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn env_overrides_win() {
        let env = HashMap::from([
            (CLUSTERING_ENV, "star".to_string()),
            (HTTP_ADDR_ENV, "127.0.0.1:9000".to_string()),
        ]);
        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).cloned()).unwrap();
        assert_eq!(config.clustering, ClusterStrategy::Star);
        assert_eq!(config.http_addr, "127.0.0.1:9000");
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(|key| (key == CLUSTERING_ENV).then(|| "spiral".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: CLUSTERING_ENV, .. }));
    }
}
