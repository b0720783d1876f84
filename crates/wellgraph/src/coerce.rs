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

//! Attribute coercion from raw CSV cells.
//!
//! Every function here is total: a value that cannot be interpreted as the
//! requested kind yields `None`, which the graph writer stores as a null
//! attribute. Nothing in this module fails a row.

use crate::model::AttrValue;
use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    Integer,
    Float,
    Flag,
    Date,
}

impl Coercion {
    pub fn apply(self, raw: &str) -> Option<AttrValue> {
        match self {
            Coercion::Text => text(raw).map(AttrValue::Text),
            Coercion::Integer => integer(raw).map(AttrValue::Integer),
            Coercion::Float => float(raw).map(AttrValue::Float),
            Coercion::Flag => flag(raw).map(AttrValue::Boolean),
            Coercion::Date => date(raw).map(AttrValue::Date),
        }
    }
}

pub fn text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Whole numbers; `"12.0"` is accepted since the export writes some integer
/// columns with a trailing zero fraction.
pub fn integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = float(trimmed)?;
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

pub fn float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Registry "YES"/"NO" columns, case-insensitive.
pub fn flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "YES" | "Y" | "TRUE" => Some(true),
        "NO" | "N" | "FALSE" => Some(false),
        _ => None,
    }
}

pub fn date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}
