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

//! Loads petroleum-registry licence, field and well-bore exports into a
//! property graph with merge-by-key writes.

pub mod coerce;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod marker;
pub mod model;
pub mod resolver;
pub mod retry;
pub mod source;
pub mod store;

pub use config::{LoaderConfig, MarkerConfig, SourceConfig, StoreConfig};
pub use coordinator::{FileSummary, ImportSummary, RunCoordinator, RunOutcome};
pub use error::{
    ConfigError, ImportError, MarkerError, ResolveError, SourceError, StoreError,
};
pub use marker::{CompletionMarker, CompletionRecord, MarkerState};
pub use model::{AttrValue, Attributes, EdgeUpsert, Label, NodeKey, NodeUpsert, Relation};
pub use resolver::{resolve, Resolution};
pub use retry::RetryPolicy;
pub use source::{locate_sources, Row, RowReader, SourceFile, SourceKind};
pub use store::{GraphCounts, GraphStore, MemoryGraph, Neo4jStore};

pub type Result<T> = std::result::Result<T, ImportError>;
