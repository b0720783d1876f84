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

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),
    #[error("Completion marker error: {0}")]
    Marker(#[from] MarkerError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source file '{}' not found", path.display())]
    MissingFile { path: PathBuf },
    #[error("Failed to open source file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Reading '{}' stopped before the end of the file: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to read header of '{}': {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Row-level resolution failures. The row is skipped, the file continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Row {line} is missing required key column '{column}'")]
    MissingKey { line: u64, column: &'static str },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Graph store not reachable within {timeout:?}: {last_error}")]
    Unreachable {
        timeout: Duration,
        last_error: String,
    },
    #[error("Query failed: {0}")]
    Query(#[from] neo4rs::Error),
    #[error("Failed to decode result column '{column}': {reason}")]
    Decode { column: String, reason: String },
}

impl StoreError {
    /// Whether retrying the same write may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::ConnectionFailed(_) | StoreError::Query(_) => true,
            StoreError::Unreachable { .. }
            | StoreError::Decode { .. } => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Failed to access marker '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Marker '{}' is not a valid completion record: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialise completion record: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
