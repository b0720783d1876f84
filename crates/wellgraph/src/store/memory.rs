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

use super::{GraphCounts, GraphStore};
use crate::error::StoreError;
use crate::model::{Attributes, EdgeUpsert, Label, NodeKey, NodeUpsert, Relation};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// In-process graph with the same merge semantics as the Cypher writer.
/// Backs dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    nodes: BTreeMap<NodeKey, Attributes>,
    edges: BTreeSet<EdgeUpsert>,
    constrained: BTreeSet<Label>,
    node_writes: u64,
    edge_writes: u64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, label: Label, name: &str) -> Option<&Attributes> {
        self.nodes.get(&NodeKey::new(label, name))
    }

    pub fn has_edge(&self, from: &NodeKey, relation: Relation, to: &NodeKey) -> bool {
        self.edges
            .contains(&EdgeUpsert::new(from.clone(), relation, to.clone()))
    }

    pub fn nodes_with_label(&self, label: Label) -> impl Iterator<Item = &NodeKey> {
        self.nodes.keys().filter(move |key| key.label == label)
    }

    pub fn edges_of(&self, relation: Relation) -> impl Iterator<Item = &EdgeUpsert> {
        self.edges.iter().filter(move |edge| edge.relation == relation)
    }

    pub fn is_constrained(&self, label: Label) -> bool {
        self.constrained.contains(&label)
    }

    /// Upsert calls received, including ones that changed nothing.
    pub fn write_calls(&self) -> (u64, u64) {
        (self.node_writes, self.edge_writes)
    }

    fn merge_node(&mut self, key: &NodeKey) -> &mut Attributes {
        self.nodes.entry(key.clone()).or_default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn prepare_schema(&mut self, labels: &[Label]) -> Result<(), StoreError> {
        self.constrained.extend(labels.iter().copied());
        Ok(())
    }

    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<(), StoreError> {
        self.node_writes += 1;
        self.merge_node(&node.key).extend_from(&node.attributes);
        Ok(())
    }

    async fn upsert_edge(&mut self, edge: &EdgeUpsert) -> Result<(), StoreError> {
        self.edge_writes += 1;
        self.merge_node(&edge.from);
        self.merge_node(&edge.to);
        self.edges.insert(edge.clone());
        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        let mut counts = GraphCounts::default();
        for key in self.nodes.keys() {
            *counts.nodes.entry(key.label).or_default() += 1;
        }
        for edge in &self.edges {
            *counts.edges.entry(edge.relation).or_default() += 1;
        }
        Ok(counts)
    }
}
