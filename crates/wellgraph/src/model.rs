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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property that holds every node's natural key.
pub const KEY_PROPERTY: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Area,
    Operator,
    License,
    Field,
    Discovery,
    Well,
    Wellbore,
    DrillingFacility,
    FacilityType,
    Base,
}

impl Label {
    pub const ALL: [Label; 10] = [
        Label::Area,
        Label::Operator,
        Label::License,
        Label::Field,
        Label::Discovery,
        Label::Well,
        Label::Wellbore,
        Label::DrillingFacility,
        Label::FacilityType,
        Label::Base,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Area => "Area",
            Label::Operator => "Operator",
            Label::License => "License",
            Label::Field => "Field",
            Label::Discovery => "Discovery",
            Label::Well => "Well",
            Label::Wellbore => "Wellbore",
            Label::DrillingFacility => "DrillingFacility",
            Label::FacilityType => "FacilityType",
            Label::Base => "Base",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    HasLicense,
    HasField,
    HasDiscovery,
    HasWellbore,
    HasWell,
    HasFacilityTypeOf,
    WasOperatedBy,
    Manages,
    HasSupplybaseOf,
}

impl Relation {
    pub const ALL: [Relation; 9] = [
        Relation::HasLicense,
        Relation::HasField,
        Relation::HasDiscovery,
        Relation::HasWellbore,
        Relation::HasWell,
        Relation::HasFacilityTypeOf,
        Relation::WasOperatedBy,
        Relation::Manages,
        Relation::HasSupplybaseOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::HasLicense => "HAS_LICENSE",
            Relation::HasField => "HAS_FIELD",
            Relation::HasDiscovery => "HAS_DISCOVERY",
            Relation::HasWellbore => "HAS_WELLBORE",
            Relation::HasWell => "HAS_WELL",
            Relation::HasFacilityTypeOf => "HAS_FACILITY_TYPE_OF",
            Relation::WasOperatedBy => "WAS_OPERATED_BY",
            Relation::Manages => "MANAGES",
            Relation::HasSupplybaseOf => "HAS_SUPPLYBASE_OF",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a node: its label plus the natural key stored in `name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub label: Label,
    pub name: String,
}

impl NodeKey {
    pub fn new(label: Label, name: impl Into<String>) -> Self {
        Self {
            label,
            name: name.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{:?})", self.label, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
}

/// Attribute set of a node. `None` marks an attribute whose source value was
/// absent or could not be coerced; it is written as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, Option<AttrValue>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<AttrValue>) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&AttrValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Overwrites with every attribute of `other`, the same way `SET n += $props` does.
    pub fn extend_from(&mut self, other: &Attributes) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub key: NodeKey,
    pub attributes: Attributes,
}

impl NodeUpsert {
    pub fn bare(label: Label, name: impl Into<String>) -> Self {
        Self {
            key: NodeKey::new(label, name),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(label: Label, name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            key: NodeKey::new(label, name),
            attributes,
        }
    }
}

/// One directed typed edge; identity is the full triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeUpsert {
    pub from: NodeKey,
    pub relation: Relation,
    pub to: NodeKey,
}

impl EdgeUpsert {
    pub fn new(from: NodeKey, relation: Relation, to: NodeKey) -> Self {
        Self { from, relation, to }
    }
}

impl fmt::Display for EdgeUpsert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-[:{}]->{}", self.from, self.relation, self.to)
    }
}
