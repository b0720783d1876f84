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

//! Row to entity resolution.
//!
//! Each source row maps to a set of node upserts followed by the edge
//! upserts that connect them. Keys come from [`natural_key`] only, so the
//! same trimmed source value always resolves to the same node.

mod field;
mod licence;
mod wellbore;

use crate::coerce::Coercion;
use crate::error::ResolveError;
use crate::model::{Attributes, EdgeUpsert, Label, NodeKey, NodeUpsert, Relation};
use crate::source::{Row, SourceKind};

pub use field::FIELD_ATTRIBUTES;
pub use licence::LICENCE_ATTRIBUTES;
pub use wellbore::WELLBORE_ATTRIBUTES;

/// Maps one source column to a node attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    pub column: &'static str,
    pub attribute: &'static str,
    pub coercion: Coercion,
}

impl AttributeSpec {
    pub const fn new(column: &'static str, attribute: &'static str, coercion: Coercion) -> Self {
        Self {
            column,
            attribute,
            coercion,
        }
    }

    pub const fn same(column: &'static str, coercion: Coercion) -> Self {
        Self::new(column, column, coercion)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub nodes: Vec<NodeUpsert>,
    pub edges: Vec<EdgeUpsert>,
}

impl Resolution {
    fn node(&mut self, upsert: NodeUpsert) -> NodeKey {
        let key = upsert.key.clone();
        self.nodes.push(upsert);
        key
    }

    /// Adds a bare node for `raw` when it holds a key.
    fn reference(&mut self, label: Label, raw: Option<&str>) -> Option<NodeKey> {
        let name = natural_key(raw)?;
        Some(self.node(NodeUpsert::bare(label, name)))
    }

    fn edge(&mut self, from: &Option<NodeKey>, relation: Relation, to: &Option<NodeKey>) {
        if let (Some(from), Some(to)) = (from, to) {
            self.edges
                .push(EdgeUpsert::new(from.clone(), relation, to.clone()));
        }
    }
}

/// Stable natural key: the trimmed source value, absent when blank.
pub fn natural_key(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builds an attribute set; every mapping yields an entry, null when the cell
/// is blank, missing or not coercible.
pub fn extract_attributes(row: &Row, specs: &[AttributeSpec]) -> Attributes {
    let mut attributes = Attributes::new();
    for spec in specs {
        let value = row.get(spec.column).and_then(|raw| spec.coercion.apply(raw));
        attributes.insert(spec.attribute, value);
    }
    attributes
}

pub fn resolve(kind: SourceKind, row: &Row) -> Result<Resolution, ResolveError> {
    let key = natural_key(row.get(kind.key_column())).ok_or(ResolveError::MissingKey {
        line: row.line(),
        column: kind.key_column(),
    })?;
    let resolution = match kind {
        SourceKind::Licence => licence::resolve(row, key),
        SourceKind::Field => field::resolve(row, key),
        SourceKind::Wellbore => wellbore::resolve(row, key),
    };
    Ok(resolution)
}
