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

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wellgraph::{
    EdgeUpsert, GraphCounts, GraphStore, Label, MemoryGraph, NodeUpsert, StoreError,
};

pub const LICENCE_CSV: &str = "\
prlName,prlLicensingActivityName,prlMainArea,prlStatus,prlDateGranted,prlDateValidTo,prlOriginalArea,prlCurrentArea,prlPhaseCurrent,prlFactPageUrl
PL001,Round 1,North Sea,INACTIVE,1965-09-01,1971-09-01,549.0,0,INITIAL,https://factpages.example/pl001
PL050,Round 3,North Sea,ACTIVE,1975-01-01,2030-12-31,400.5,120.25,PRODUCTION,https://factpages.example/pl050
";

pub const FIELD_CSV: &str = "\
fldName,cmpLongName,fldCurrentActivitySatus,wlbName,wlbCompletionDate,fldMainArea,fldOwnerKind,fldMainSupplyBase,fldHcType
TROLL,Equinor Energy AS,Producing,31/2-1,1979-10-07,North sea,PRODUCTION LICENSE,Mongstad,GAS
";

// Row 4 has no wellbore name, row 5 has the wrong field count and the
// second 31/2-1 A row repeats the same well-wellbore pair.
pub const WELLBORE_CSV: &str = "\
wlbWellboreName,wlbWell,wlbMainArea,wlbProductionLicence,wlbField,wlbDiscovery,wlbDrillingFacility,wlbFacilityTypeDrilling,wlbDrillingOperator,wlbTotalDepth,wlbEntryYear
31/2-1,31/2-1,NORTH SEA,PL050,TROLL,31/2-1 TROLL,BORGNY DOLPHIN,SEMISUB STEEL,Equinor Energy AS,1590,1979
31/2-1 A,31/2-1,NORTH SEA,PL050,TROLL,,WEST EPSILON,JACK-UP 3 LEGS,Equinor Energy AS,2100.5,1985
31/2-1 A,31/2-1,NORTH SEA,PL050,TROLL,,WEST EPSILON,JACK-UP 3 LEGS,Equinor Energy AS,9999,1990
,31/2-2,NORTH SEA,PL050,TROLL,,,,,,
31/2-3,31/2-3,NORTH SEA
31/4-1,31/4-1,NORTH SEA,PL001,,,,,Aker BP ASA,abc,
";

/// Writes the three registry exports into a fresh directory.
pub fn fixture_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sources(dir.path(), LICENCE_CSV, FIELD_CSV, WELLBORE_CSV);
    dir
}

pub fn write_sources(dir: &Path, licence: &str, field: &str, wellbore: &str) {
    fs::write(dir.join("licence.csv"), licence).expect("write licence.csv");
    fs::write(dir.join("field.csv"), field).expect("write field.csv");
    fs::write(dir.join("wellbore_all_long.csv"), wellbore).expect("write wellbore csv");
}

/// In-memory store that fails on demand.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryGraph,
    /// Upcoming node writes that fail with a transient error.
    pub transient_failures: u32,
    /// Node whose writes always fail with a non-retryable error.
    pub rejected: Option<(Label, String)>,
    pub attempts: u32,
}

impl FlakyStore {
    pub fn failing_transiently(times: u32) -> Self {
        Self {
            transient_failures: times,
            ..Self::default()
        }
    }

    pub fn rejecting(label: Label, name: &str) -> Self {
        Self {
            rejected: Some((label, name.to_string())),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn prepare_schema(&mut self, labels: &[Label]) -> Result<(), StoreError> {
        self.inner.prepare_schema(labels).await
    }

    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<(), StoreError> {
        self.attempts += 1;
        if self.transient_failures > 0 {
            self.transient_failures -= 1;
            return Err(StoreError::ConnectionFailed("connection reset".to_string()));
        }
        if let Some((label, name)) = &self.rejected {
            if node.key.label == *label && node.key.name == *name {
                return Err(StoreError::Unreachable {
                    timeout: Duration::ZERO,
                    last_error: format!("connection dropped while writing {}", node.key),
                });
            }
        }
        self.inner.upsert_node(node).await
    }

    async fn upsert_edge(&mut self, edge: &EdgeUpsert) -> Result<(), StoreError> {
        self.inner.upsert_edge(edge).await
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        self.inner.counts().await
    }
}

/// Byte source that yields `limit` bytes of `data` and then an I/O error.
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
    limit: usize,
}

impl FailingReader {
    pub fn new(data: &str, limit: usize) -> Self {
        Self {
            data: data.as_bytes().to_vec(),
            pos: 0,
            limit,
        }
    }
}

impl std::io::Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let end = self.limit.min(self.data.len());
        if self.pos >= end {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "volume went away",
            ));
        }
        let n = buf.len().min(end - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
