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

//! Drives one import: sources in fixed order, every row resolved and written,
//! then the completion marker.

use crate::config::LoaderConfig;
use crate::error::{ImportError, StoreError};
use crate::marker::{CompletionMarker, CompletionRecord};
use crate::model::{EdgeUpsert, Label, NodeKey, NodeUpsert};
use crate::resolver::{resolve, Resolution};
use crate::retry::RetryPolicy;
use crate::source::{locate_sources, RowReader, SourceFile, SourceKind};
use crate::store::{GraphCounts, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub source: SourceKind,
    pub rows_read: u64,
    pub rows_imported: u64,
    pub malformed_rows: u64,
    pub missing_key_rows: u64,
    pub failed_rows: u64,
    pub node_writes: u64,
    pub edge_writes: u64,
}

impl FileSummary {
    fn new(source: SourceKind) -> Self {
        Self {
            source,
            rows_read: 0,
            rows_imported: 0,
            malformed_rows: 0,
            missing_key_rows: 0,
            failed_rows: 0,
            node_writes: 0,
            edge_writes: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub files: Vec<FileSummary>,
    /// Store totals after the run; absent when the count query failed.
    pub counts: Option<GraphCounts>,
}

impl ImportSummary {
    pub fn failed_rows(&self) -> u64 {
        self.files.iter().map(|f| f.failed_rows).sum()
    }

    pub fn skipped_rows(&self) -> u64 {
        self.files
            .iter()
            .map(|f| f.malformed_rows + f.missing_key_rows)
            .sum()
    }

    pub fn rows_imported(&self) -> u64 {
        self.files.iter().map(|f| f.rows_imported).sum()
    }

    pub fn file(&self, source: SourceKind) -> Option<&FileSummary> {
        self.files.iter().find(|f| f.source == source)
    }

    /// Every readable row either landed or was skipped as unusable.
    pub fn is_clean(&self) -> bool {
        self.failed_rows() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The marker was already present; nothing was touched.
    AlreadyComplete(Option<CompletionRecord>),
    Completed(ImportSummary),
    /// Some rows failed to write; the marker was not recorded.
    Incomplete(ImportSummary),
}

/// Upserts already applied during this run.
#[derive(Debug, Default)]
struct AppliedSet {
    attributed: HashSet<NodeKey>,
    referenced: HashSet<NodeKey>,
    edges: HashSet<EdgeUpsert>,
}

impl AppliedSet {
    /// The first attributed occurrence of a key wins; bare references add
    /// nothing once the key has been written in any form.
    fn needs_node(&self, node: &NodeUpsert) -> bool {
        if self.attributed.contains(&node.key) {
            return false;
        }
        !node.attributes.is_empty() || !self.referenced.contains(&node.key)
    }

    fn record_node(&mut self, node: &NodeUpsert) {
        if node.attributes.is_empty() {
            self.referenced.insert(node.key.clone());
        } else {
            self.attributed.insert(node.key.clone());
        }
    }

    fn needs_edge(&self, edge: &EdgeUpsert) -> bool {
        !self.edges.contains(edge)
    }

    fn record_edge(&mut self, edge: &EdgeUpsert) {
        self.edges.insert(edge.clone());
    }
}

#[derive(Clone, Copy)]
enum Write<'a> {
    Node(&'a NodeUpsert),
    Edge(&'a EdgeUpsert),
}

impl fmt::Display for Write<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Write::Node(node) => write!(f, "node {}", node.key),
            Write::Edge(edge) => write!(f, "edge {edge}"),
        }
    }
}

pub struct RunCoordinator<S: GraphStore> {
    store: S,
    retry: RetryPolicy,
    progress_interval: u64,
    applied: AppliedSet,
}

impl<S: GraphStore> RunCoordinator<S> {
    pub fn new(store: S, config: &LoaderConfig) -> Self {
        Self::with_policy(store, config.retry.clone(), config.progress_interval)
    }

    pub fn with_policy(store: S, retry: RetryPolicy, progress_interval: u64) -> Self {
        Self {
            store,
            retry,
            progress_interval,
            applied: AppliedSet::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Full import guarded by the completion marker.
    pub async fn run(
        &mut self,
        csv_dir: &Path,
        marker: &mut CompletionMarker,
    ) -> Result<RunOutcome, ImportError> {
        if marker.is_complete() {
            info!(
                "Completion marker {} present, skipping import",
                marker.path().display()
            );
            return Ok(RunOutcome::AlreadyComplete(marker.record().cloned()));
        }

        let summary = self.import_dir(csv_dir).await?;
        if summary.is_clean() {
            marker.complete(&summary)?;
            Ok(RunOutcome::Completed(summary))
        } else {
            warn!(
                failed_rows = summary.failed_rows(),
                "Import finished with write failures; completion marker not recorded"
            );
            Ok(RunOutcome::Incomplete(summary))
        }
    }

    /// Imports every source under `csv_dir` without consulting any marker.
    pub async fn import_dir(&mut self, csv_dir: &Path) -> Result<ImportSummary, ImportError> {
        let sources = locate_sources(csv_dir)?;
        self.import(&sources).await
    }

    pub async fn import(&mut self, sources: &[SourceFile]) -> Result<ImportSummary, ImportError> {
        self.store.prepare_schema(&Label::ALL).await?;

        let mut summary = ImportSummary::default();
        for source in sources {
            summary.files.push(self.import_file(source).await?);
        }

        summary.counts = match self.store.counts().await {
            Ok(counts) => {
                info!(
                    nodes = counts.total_nodes(),
                    edges = counts.total_edges(),
                    "Graph totals after import"
                );
                Some(counts)
            }
            Err(e) => {
                warn!("Could not read graph totals: {e}");
                None
            }
        };
        Ok(summary)
    }

    async fn import_file(&mut self, source: &SourceFile) -> Result<FileSummary, ImportError> {
        let reader = RowReader::open(&source.path)?;
        info!("Importing {}", source.path.display());
        self.import_rows(source.kind, reader).await
    }

    /// Imports every row of an opened source. A read failure before the end
    /// of input is fatal so the run never counts as complete.
    pub async fn import_rows(
        &mut self,
        kind: SourceKind,
        mut reader: RowReader,
    ) -> Result<FileSummary, ImportError> {
        let mut summary = FileSummary::new(kind);
        if !reader.has_column(kind.key_column()) {
            warn!(
                "{kind} has no '{}' column; every row will be skipped",
                kind.key_column()
            );
        }

        for row in reader.by_ref() {
            summary.rows_read += 1;
            match resolve(kind, &row) {
                Ok(resolution) => match self.apply(&resolution, &mut summary).await {
                    Ok(()) => summary.rows_imported += 1,
                    Err(e) => {
                        error!(file = %kind, line = row.line(), "Row not written: {e}");
                        summary.failed_rows += 1;
                    }
                },
                Err(e) => {
                    warn!(file = %kind, "Skipping row: {e}");
                    summary.missing_key_rows += 1;
                }
            }
            if self.progress_interval > 0 && summary.rows_read % self.progress_interval == 0 {
                info!(file = %kind, rows = summary.rows_read, "Import progress");
            }
        }
        summary.malformed_rows = reader.skipped();
        reader.finish()?;

        info!(
            file = %kind,
            rows = summary.rows_read,
            imported = summary.rows_imported,
            skipped = summary.malformed_rows + summary.missing_key_rows,
            failed = summary.failed_rows,
            "Finished source file"
        );
        Ok(summary)
    }

    async fn apply(
        &mut self,
        resolution: &Resolution,
        summary: &mut FileSummary,
    ) -> Result<(), StoreError> {
        for node in &resolution.nodes {
            if !self.applied.needs_node(node) {
                continue;
            }
            self.write(Write::Node(node)).await?;
            self.applied.record_node(node);
            summary.node_writes += 1;
        }
        for edge in &resolution.edges {
            if !self.applied.needs_edge(edge) {
                continue;
            }
            self.write(Write::Edge(edge)).await?;
            self.applied.record_edge(edge);
            summary.edge_writes += 1;
        }
        Ok(())
    }

    async fn write(&mut self, op: Write<'_>) -> Result<(), StoreError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match op {
                Write::Node(node) => self.store.upsert_node(node).await,
                Write::Edge(edge) => self.store.upsert_edge(edge).await,
            };
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(attempt, "Write of {op} failed: {e}; retrying in {delay:?}");
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
