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

use super::{extract_attributes, natural_key, AttributeSpec, Resolution};
use crate::coerce::Coercion;
use crate::model::{Label, NodeUpsert, Relation};
use crate::source::Row;

/// Shared by Wellbore nodes and by the Well node of a main wellbore.
pub const WELLBORE_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::same("wlbPurpose", Coercion::Text),
    AttributeSpec::same("wlbStatus", Coercion::Text),
    AttributeSpec::same("wlbContent", Coercion::Text),
    AttributeSpec::new("wlbNsDecDeg", "latitude", Coercion::Float),
    AttributeSpec::new("wlbEwDecDeg", "longitude", Coercion::Float),
    AttributeSpec::same("wlbSubSea", Coercion::Flag),
    AttributeSpec::new("wlbMaxInclation", "wlbMaxInclination", Coercion::Float),
    AttributeSpec::same("wlbKellyBushElevation", Coercion::Float),
    AttributeSpec::same("wlbFinalVerticalDepth", Coercion::Float),
    AttributeSpec::same("wlbTotalDepth", Coercion::Float),
    AttributeSpec::same("wlbWaterDepth", Coercion::Float),
    AttributeSpec::same("wlbKickOffPoint", Coercion::Float),
    AttributeSpec::same("wlbMultilateral", Coercion::Flag),
    AttributeSpec::same("wlbDiskosWellboreType", Coercion::Text),
    AttributeSpec::same("wlbFactPageUrl", Coercion::Text),
    AttributeSpec::same("wlbDrillingDays", Coercion::Integer),
    AttributeSpec::same("wlbEntryYear", Coercion::Integer),
    AttributeSpec::same("wlbCompletionYear", Coercion::Integer),
    AttributeSpec::same("wlbAgeAtTd", Coercion::Text),
    AttributeSpec::same("wlbFacilityTypeDrilling", Coercion::Text),
];

pub(super) fn resolve(row: &Row, wellbore: String) -> Resolution {
    let mut resolution = Resolution::default();
    let attributes = extract_attributes(row, WELLBORE_ATTRIBUTES);

    let well_name = natural_key(row.get("wlbWell"));
    let is_main_wellbore = well_name.as_deref() == Some(wellbore.as_str());

    let area = resolution.reference(Label::Area, row.get("wlbMainArea"));
    let licence = resolution.reference(Label::License, row.get("wlbProductionLicence"));
    let field = resolution.reference(Label::Field, row.get("wlbField"));
    let discovery = resolution.reference(Label::Discovery, row.get("wlbDiscovery"));
    let well = well_name.map(|name| {
        let upsert = if is_main_wellbore {
            NodeUpsert::with_attributes(Label::Well, name, attributes.clone())
        } else {
            NodeUpsert::bare(Label::Well, name)
        };
        resolution.node(upsert)
    });
    let wellbore = Some(resolution.node(NodeUpsert::with_attributes(
        Label::Wellbore,
        wellbore,
        attributes,
    )));
    let facility = resolution.reference(Label::DrillingFacility, row.get("wlbDrillingFacility"));
    let facility_type =
        resolution.reference(Label::FacilityType, row.get("wlbFacilityTypeDrilling"));
    let operator = resolution.reference(Label::Operator, row.get("wlbDrillingOperator"));

    resolution.edge(&area, Relation::HasLicense, &licence);
    resolution.edge(&licence, Relation::HasField, &field);
    resolution.edge(&field, Relation::HasDiscovery, &discovery);
    if !is_main_wellbore {
        resolution.edge(&well, Relation::HasWellbore, &wellbore);
    }
    resolution.edge(&facility, Relation::HasWell, &wellbore);
    resolution.edge(&wellbore, Relation::HasFacilityTypeOf, &facility_type);
    resolution.edge(&wellbore, Relation::WasOperatedBy, &operator);
    resolution
}
