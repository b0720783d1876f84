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

pub mod memory;
pub mod neo4j;

pub use memory::MemoryGraph;
pub use neo4j::Neo4jStore;

use crate::error::StoreError;
use crate::model::{EdgeUpsert, Label, NodeUpsert, Relation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Merge-by-key graph writer.
///
/// Both upserts must be idempotent: calling either any number of times with
/// the same argument leaves exactly the nodes and edges of the first call.
/// `upsert_edge` merges its endpoints by key, so callers may write an edge
/// before either node.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn prepare_schema(&mut self, labels: &[Label]) -> Result<(), StoreError>;

    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<(), StoreError>;

    async fn upsert_edge(&mut self, edge: &EdgeUpsert) -> Result<(), StoreError>;

    async fn counts(&self) -> Result<GraphCounts, StoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub nodes: BTreeMap<Label, u64>,
    pub edges: BTreeMap<Relation, u64>,
}

impl GraphCounts {
    pub fn nodes_of(&self, label: Label) -> u64 {
        self.nodes.get(&label).copied().unwrap_or(0)
    }

    pub fn edges_of(&self, relation: Relation) -> u64 {
        self.edges.get(&relation).copied().unwrap_or(0)
    }

    pub fn total_nodes(&self) -> u64 {
        self.nodes.values().sum()
    }

    pub fn total_edges(&self) -> u64 {
        self.edges.values().sum()
    }
}
