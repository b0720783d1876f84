// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub marker: MarkerConfig,
    pub retry: RetryPolicy,
    /// Log progress every N rows per file; 0 disables.
    pub progress_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: usize,
    pub connect_timeout_secs: u64,
    pub probe_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub csv_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub path: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            source: SourceConfig::default(),
            marker: MarkerConfig::default(),
            retry: RetryPolicy::default(),
            progress_interval: 1_000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://neo4j:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            max_connections: 4,
            connect_timeout_secs: 60,
            probe_interval_ms: 2_000,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("/data/csvs"),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/data/.wellgraph-initialized"),
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

impl LoaderConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlays process environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.store.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.store.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.store.password = password;
        }
        if let Some(database) = lookup("NEO4J_DATABASE") {
            self.store.database = Some(database).filter(|db| !db.trim().is_empty());
        }
        if let Some(secs) = lookup("NEO4J_CONNECT_TIMEOUT_SECS") {
            self.store.connect_timeout_secs = parse_var("NEO4J_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(dir) = lookup("CSV_DIR") {
            self.source.csv_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("IMPORT_MARKER") {
            self.marker.path = PathBuf::from(path);
        }
        if let Some(attempts) = lookup("IMPORT_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_var("IMPORT_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(interval) = lookup("IMPORT_PROGRESS_INTERVAL") {
            self.progress_interval = parse_var("IMPORT_PROGRESS_INTERVAL", &interval)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.uri.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "store.uri".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry.max_attempts".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "store.max_connections".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("NEO4J_URI", "bolt://localhost:7687"),
            ("CSV_DIR", "/tmp/csvs"),
            ("IMPORT_MAX_ATTEMPTS", "5"),
            ("NEO4J_DATABASE", " "),
        ]
        .into_iter()
        .collect();
        let mut config = LoaderConfig::default();
        config
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.store.uri, "bolt://localhost:7687");
        assert_eq!(config.store.user, "neo4j");
        assert_eq!(config.source.csv_dir, PathBuf::from("/tmp/csvs"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.store.database, None);
    }

    #[test]
    fn bad_numeric_env_is_reported() {
        let mut config = LoaderConfig::default();
        let err = config
            .apply_env_from(|key| (key == "IMPORT_MAX_ATTEMPTS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("IMPORT_MAX_ATTEMPTS"));
    }

    #[test]
    fn toml_sections_are_optional() {
        let config: LoaderConfig = toml::from_str(
            r#"
progress_interval = 50

[store]
uri = "bolt://graph:7687"

[retry]
max_attempts = 4
"#,
        )
        .unwrap();
        assert_eq!(config.store.uri, "bolt://graph:7687");
        assert_eq!(config.store.password, "password");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.progress_interval, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = LoaderConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
