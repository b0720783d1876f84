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
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{AttrValue, Attributes, EdgeUpsert, Label, NodeUpsert, Relation, KEY_PROPERTY};
use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Bolt-backed writer. Labels and relation types come from closed enums, so
/// they are interpolated; all values travel as parameters.
pub struct Neo4jStore {
    graph: Graph,
    uri: String,
}

impl Neo4jStore {
    /// Builds the driver and blocks until the server answers `RETURN 1` or
    /// the configured timeout elapses.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| StoreError::ConnectionFailed(format!("Invalid driver config: {e}")))?;
        let graph = Graph::connect(neo_config)
            .map_err(|e| StoreError::ConnectionFailed(format!("Failed to create driver: {e}")))?;

        let store = Self {
            graph,
            uri: config.uri.clone(),
        };
        store
            .wait_until_ready(config.connect_timeout(), config.probe_interval())
            .await?;
        info!("Connection to Neo4j at {} established", store.uri);
        Ok(store)
    }

    pub async fn wait_until_ready(
        &self,
        limit: Duration,
        interval: Duration,
    ) -> Result<(), StoreError> {
        let deadline = Instant::now() + limit;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let last_error = match timeout(remaining, self.graph.run(query("RETURN 1"))).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => e.to_string(),
                Err(_) => "probe timed out".to_string(),
            };
            if Instant::now() + interval >= deadline {
                return Err(StoreError::Unreachable {
                    timeout: limit,
                    last_error,
                });
            }
            warn!(
                attempt,
                "Neo4j at {} not ready yet: {last_error}; retrying in {interval:?}", self.uri
            );
            sleep(interval).await;
        }
    }

    async fn count(&self, cypher: String) -> Result<u64, StoreError> {
        let mut rows = self.graph.execute(query(&cypher)).await?;
        let Some(row) = rows.next().await? else {
            return Ok(0);
        };
        let count: i64 = row.get("count").map_err(|e| StoreError::Decode {
            column: "count".to_string(),
            reason: e.to_string(),
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn to_bolt(value: Option<&AttrValue>) -> BoltType {
    match value {
        None => BoltType::Null(BoltNull),
        Some(AttrValue::Text(s)) => s.clone().into(),
        Some(AttrValue::Integer(i)) => (*i).into(),
        Some(AttrValue::Float(f)) => (*f).into(),
        Some(AttrValue::Boolean(b)) => (*b).into(),
        Some(AttrValue::Date(d)) => d.format("%Y-%m-%d").to_string().into(),
    }
}

fn to_props(attributes: &Attributes) -> HashMap<String, BoltType> {
    attributes
        .iter()
        .filter(|(name, _)| *name != KEY_PROPERTY)
        .map(|(name, value)| (name.to_string(), to_bolt(value)))
        .collect()
}

fn constraint_name(label: Label) -> String {
    format!("{}_name_unique", label.as_str().to_lowercase())
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn prepare_schema(&mut self, labels: &[Label]) -> Result<(), StoreError> {
        for &label in labels {
            let cypher = format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{KEY_PROPERTY} IS UNIQUE",
                constraint_name(label),
                label
            );
            self.graph.run(query(&cypher)).await?;
            debug!("Uniqueness constraint ensured for label '{label}'");
        }
        Ok(())
    }

    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<(), StoreError> {
        let label = node.key.label;
        let q = if node.attributes.is_empty() {
            query(&format!("MERGE (n:{label} {{{KEY_PROPERTY}: $name}})"))
                .param("name", node.key.name.as_str())
        } else {
            query(&format!(
                "MERGE (n:{label} {{{KEY_PROPERTY}: $name}}) SET n += $props"
            ))
            .param("name", node.key.name.as_str())
            .param("props", to_props(&node.attributes))
        };
        self.graph.run(q).await?;
        Ok(())
    }

    async fn upsert_edge(&mut self, edge: &EdgeUpsert) -> Result<(), StoreError> {
        let cypher = format!(
            "MERGE (a:{from} {{{KEY_PROPERTY}: $from}}) \
             MERGE (b:{to} {{{KEY_PROPERTY}: $to}}) \
             MERGE (a)-[:{relation}]->(b)",
            from = edge.from.label,
            to = edge.to.label,
            relation = edge.relation,
        );
        let q = query(&cypher)
            .param("from", edge.from.name.as_str())
            .param("to", edge.to.name.as_str());
        self.graph.run(q).await?;
        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        let mut counts = GraphCounts::default();
        for label in Label::ALL {
            let n = self
                .count(format!("MATCH (n:{label}) RETURN count(n) AS count"))
                .await?;
            counts.nodes.insert(label, n);
        }
        for relation in Relation::ALL {
            let n = self
                .count(format!(
                    "MATCH ()-[r:{relation}]->() RETURN count(r) AS count"
                ))
                .await?;
            counts.edges.insert(relation, n);
        }
        Ok(counts)
    }
}
