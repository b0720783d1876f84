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

use super::{extract_attributes, AttributeSpec, Resolution};
use crate::coerce::Coercion;
use crate::model::{Label, NodeUpsert, Relation};
use crate::source::Row;

// The export misspells the activity status column.
pub const FIELD_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::same("cmpLongName", Coercion::Text),
    AttributeSpec::new(
        "fldCurrentActivitySatus",
        "fldCurrentActivityStatus",
        Coercion::Text,
    ),
    AttributeSpec::new("wlbName", "Discovery_Wellbore", Coercion::Text),
    AttributeSpec::same("wlbCompletionDate", Coercion::Date),
    AttributeSpec::same("fldMainArea", Coercion::Text),
    AttributeSpec::same("fldOwnerKind", Coercion::Text),
    AttributeSpec::same("fldMainSupplyBase", Coercion::Text),
    AttributeSpec::same("fldHcType", Coercion::Text),
];

pub(super) fn resolve(row: &Row, field: String) -> Resolution {
    let mut resolution = Resolution::default();
    let field = Some(resolution.node(NodeUpsert::with_attributes(
        Label::Field,
        field,
        extract_attributes(row, FIELD_ATTRIBUTES),
    )));
    let operator = resolution.reference(Label::Operator, row.get("cmpLongName"));
    let base = resolution.reference(Label::Base, row.get("fldMainSupplyBase"));

    resolution.edge(&operator, Relation::Manages, &field);
    resolution.edge(&field, Relation::HasSupplybaseOf, &base);
    resolution
}
