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

//! Persisted "import finished" flag.
//!
//! The marker is read once when the process starts. Its presence means a
//! previous run finished every source without write failures; the startup
//! wrapper and the coordinator both short-circuit on it. An empty file left
//! by external tooling also counts as complete.

use crate::coordinator::ImportSummary;
use crate::error::MarkerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub completed_at: DateTime<Utc>,
    pub loader_version: String,
    pub summary: ImportSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerState {
    Pending,
    Complete(Option<CompletionRecord>),
}

#[derive(Debug)]
pub struct CompletionMarker {
    path: PathBuf,
    state: MarkerState,
}

impl CompletionMarker {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MarkerError> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => MarkerState::Complete(None),
            Ok(raw) => {
                let record = serde_json::from_str(&raw).map_err(|source| MarkerError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
                MarkerState::Complete(Some(record))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => MarkerState::Pending,
            Err(source) => return Err(MarkerError::Io { path, source }),
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &MarkerState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, MarkerState::Complete(_))
    }

    pub fn record(&self) -> Option<&CompletionRecord> {
        match &self.state {
            MarkerState::Complete(record) => record.as_ref(),
            MarkerState::Pending => None,
        }
    }

    /// Persists the marker via write-then-rename so a crash never leaves a
    /// half-written record behind.
    pub fn complete(&mut self, summary: &ImportSummary) -> Result<CompletionRecord, MarkerError> {
        let record = CompletionRecord {
            completed_at: Utc::now(),
            loader_version: env!("CARGO_PKG_VERSION").to_string(),
            summary: summary.clone(),
        };
        let body = serde_json::to_string_pretty(&record)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, body).map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;
        info!("Import marked complete at {}", self.path.display());

        self.state = MarkerState::Complete(Some(record.clone()));
        Ok(record)
    }

    /// Removes the marker so the next run imports again.
    pub fn reset(&mut self) -> Result<(), MarkerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Removed completion marker {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(self.io_error(source)),
        }
        self.state = MarkerState::Pending;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> MarkerError {
        MarkerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
