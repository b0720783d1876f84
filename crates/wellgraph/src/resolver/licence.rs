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
use crate::model::{Label, NodeUpsert};
use crate::source::Row;

pub const LICENCE_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::same("prlLicensingActivityName", Coercion::Text),
    AttributeSpec::same("prlMainArea", Coercion::Text),
    AttributeSpec::same("prlStatus", Coercion::Text),
    AttributeSpec::same("prlDateGranted", Coercion::Date),
    AttributeSpec::same("prlDateValidTo", Coercion::Date),
    AttributeSpec::same("prlOriginalArea", Coercion::Float),
    AttributeSpec::same("prlCurrentArea", Coercion::Float),
    AttributeSpec::same("prlPhaseCurrent", Coercion::Text),
    AttributeSpec::same("prlFactPageUrl", Coercion::Text),
];

pub(super) fn resolve(row: &Row, licence: String) -> Resolution {
    let mut resolution = Resolution::default();
    resolution.node(NodeUpsert::with_attributes(
        Label::License,
        licence,
        extract_attributes(row, LICENCE_ATTRIBUTES),
    ));
    resolution
}
