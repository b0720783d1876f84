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

use crate::error::SourceError;
use csv::{StringRecord, StringRecordsIntoIter};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

/// One well-formed data record. Column order follows the file header.
#[derive(Debug, Clone)]
pub struct Row {
    line: u64,
    header: Arc<Header>,
    record: StringRecord,
}

impl Row {
    /// 1-based line in the source file, header included.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Trimmed cell value; `None` for unknown columns and blank cells.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = *self.header.index.get(column)?;
        let value = self.record.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

}

/// Lazy reader over one CSV source. Malformed records are logged and
/// skipped; iteration never yields an error. An I/O failure ends iteration
/// and is kept for [`RowReader::finish`].
pub struct RowReader {
    path: PathBuf,
    header: Arc<Header>,
    records: StringRecordsIntoIter<Box<dyn Read + Send>>,
    skipped: u64,
    read_error: Option<csv::Error>,
}

impl RowReader {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if !path.is_file() {
            return Err(SourceError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path, file)
    }

    /// Reads CSV from any byte source; `path` only labels log lines and errors.
    pub fn from_reader<R>(path: &Path, input: R) -> Result<Self, SourceError>
    where
        R: Read + Send + 'static,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(Box::new(input) as Box<dyn Read + Send>);
        let names: Vec<String> = reader
            .headers()
            .map_err(|source| SourceError::Header {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            header: Arc::new(Header { names, index }),
            records: reader.into_records(),
            skipped: 0,
            read_error: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.header.names
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header.index.contains_key(column)
    }

    /// Malformed rows skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Fails when iteration stopped on an I/O error before the end of input.
    pub fn finish(&mut self) -> Result<(), SourceError> {
        match self.read_error.take() {
            Some(source) => Err(SourceError::Read {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }
}

impl Iterator for RowReader {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.read_error.is_some() {
            return None;
        }
        loop {
            match self.records.next()? {
                Ok(record) => {
                    let line = record.position().map_or(0, |p| p.line());
                    return Some(Row {
                        line,
                        header: Arc::clone(&self.header),
                        record,
                    });
                }
                Err(e) if e.is_io_error() => {
                    self.read_error = Some(e);
                    return None;
                }
                Err(e) => {
                    self.skipped += 1;
                    let line = e.position().map_or(0, |p| p.line());
                    warn!(
                        file = %self.path.display(),
                        line,
                        "Skipping malformed row: {e}"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
impl Row {
    pub(crate) fn from_pairs(line: u64, pairs: &[(&str, &str)]) -> Self {
        let names: Vec<String> = pairs.iter().map(|(k, _)| k.to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            line,
            header: Arc::new(Header { names, index }),
            record: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }
}
