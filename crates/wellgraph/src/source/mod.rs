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

pub mod reader;

pub use reader::{Row, RowReader};

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The registry exports the loader understands, in import order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Licence,
    Field,
    Wellbore,
}

impl SourceKind {
    pub const IMPORT_ORDER: [SourceKind; 3] =
        [SourceKind::Licence, SourceKind::Field, SourceKind::Wellbore];

    pub fn file_name(&self) -> &'static str {
        match self {
            SourceKind::Licence => "licence.csv",
            SourceKind::Field => "field.csv",
            SourceKind::Wellbore => "wellbore_all_long.csv",
        }
    }

    /// Column whose absence makes a row unusable.
    pub fn key_column(&self) -> &'static str {
        match self {
            SourceKind::Licence => "prlName",
            SourceKind::Field => "fldName",
            SourceKind::Wellbore => "wlbWellboreName",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Resolves every source in import order and checks that each file exists.
pub fn locate_sources(csv_dir: &Path) -> Result<Vec<SourceFile>, SourceError> {
    SourceKind::IMPORT_ORDER
        .iter()
        .map(|&kind| {
            let path = csv_dir.join(kind.file_name());
            if path.is_file() {
                Ok(SourceFile { kind, path })
            } else {
                Err(SourceError::MissingFile { path })
            }
        })
        .collect()
}
