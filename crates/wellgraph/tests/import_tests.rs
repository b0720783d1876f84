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

mod common;

use common::{fixture_dir, FailingReader, FlakyStore, LICENCE_CSV};
use std::fs;
use std::path::Path;
use wellgraph::{
    AttrValue, CompletionMarker, GraphStore, ImportError, Label, MemoryGraph, NodeKey,
    Relation, RetryPolicy, RowReader, RunCoordinator, RunOutcome, SourceError, SourceKind,
};

fn coordinator<S: GraphStore>(store: S) -> RunCoordinator<S> {
    RunCoordinator::with_policy(store, RetryPolicy::no_delay(3), 2)
}

#[tokio::test]
async fn test_import_builds_expected_graph() {
    let dir = fixture_dir();
    let mut run = coordinator(MemoryGraph::new());
    let summary = run.import_dir(dir.path()).await.unwrap();
    let counts = summary.counts.clone().unwrap();

    assert_eq!(counts.nodes_of(Label::License), 2);
    assert_eq!(counts.nodes_of(Label::Field), 1);
    assert_eq!(counts.nodes_of(Label::Operator), 2);
    assert_eq!(counts.nodes_of(Label::Base), 1);
    assert_eq!(counts.nodes_of(Label::Area), 1);
    assert_eq!(counts.nodes_of(Label::Discovery), 1);
    assert_eq!(counts.nodes_of(Label::Well), 2);
    assert_eq!(counts.nodes_of(Label::Wellbore), 3);
    assert_eq!(counts.nodes_of(Label::DrillingFacility), 2);
    assert_eq!(counts.nodes_of(Label::FacilityType), 2);

    assert_eq!(counts.edges_of(Relation::Manages), 1);
    assert_eq!(counts.edges_of(Relation::HasSupplybaseOf), 1);
    assert_eq!(counts.edges_of(Relation::HasLicense), 2);
    assert_eq!(counts.edges_of(Relation::HasField), 1);
    assert_eq!(counts.edges_of(Relation::HasDiscovery), 1);
    assert_eq!(counts.edges_of(Relation::HasWellbore), 1);
    assert_eq!(counts.edges_of(Relation::HasWell), 2);
    assert_eq!(counts.edges_of(Relation::HasFacilityTypeOf), 2);
    assert_eq!(counts.edges_of(Relation::WasOperatedBy), 3);

    let store = run.store();
    assert!(Label::ALL.iter().all(|&label| store.is_constrained(label)));
}

#[tokio::test]
async fn test_shared_operator_is_one_node() {
    let dir = fixture_dir();
    let mut run = coordinator(MemoryGraph::new());
    run.import_dir(dir.path()).await.unwrap();
    let store = run.store();

    let operators: Vec<_> = store
        .nodes_with_label(Label::Operator)
        .filter(|key| key.name == "Equinor Energy AS")
        .collect();
    assert_eq!(operators.len(), 1);

    let equinor = NodeKey::new(Label::Operator, "Equinor Energy AS");
    assert!(store.has_edge(&equinor, Relation::Manages, &NodeKey::new(Label::Field, "TROLL")));
    assert!(store.has_edge(
        &NodeKey::new(Label::Wellbore, "31/2-1"),
        Relation::WasOperatedBy,
        &equinor
    ));
}

#[tokio::test]
async fn test_first_attributed_row_wins() {
    let dir = fixture_dir();
    let mut run = coordinator(MemoryGraph::new());
    run.import_dir(dir.path()).await.unwrap();
    let store = run.store();

    let sidetrack = store.node(Label::Wellbore, "31/2-1 A").unwrap();
    assert_eq!(sidetrack.get("wlbTotalDepth"), Some(&AttrValue::Float(2100.5)));
    assert_eq!(sidetrack.get("wlbEntryYear"), Some(&AttrValue::Integer(1985)));

    let well = store.node(Label::Well, "31/2-1").unwrap();
    assert_eq!(well.get("wlbTotalDepth"), Some(&AttrValue::Float(1590.0)));

    let field = store.node(Label::Field, "TROLL").unwrap();
    assert_eq!(
        field.get("fldCurrentActivityStatus"),
        Some(&AttrValue::Text("Producing".to_string()))
    );

    let unparsed = store.node(Label::Wellbore, "31/4-1").unwrap();
    assert!(unparsed.contains("wlbTotalDepth"));
    assert_eq!(unparsed.get("wlbTotalDepth"), None);
}

#[tokio::test]
async fn test_bad_rows_are_skipped_and_counted() {
    let dir = fixture_dir();
    let mut run = coordinator(MemoryGraph::new());
    let summary = run.import_dir(dir.path()).await.unwrap();

    let wellbores = summary.file(SourceKind::Wellbore).unwrap();
    assert_eq!(wellbores.rows_read, 5);
    assert_eq!(wellbores.missing_key_rows, 1);
    assert_eq!(wellbores.malformed_rows, 1);
    assert_eq!(wellbores.rows_imported, 4);
    assert_eq!(wellbores.failed_rows, 0);
    assert_eq!(summary.skipped_rows(), 2);

    // The row after the malformed one still lands.
    assert!(run.store().node(Label::Wellbore, "31/4-1").is_some());
    assert!(run.store().node(Label::Well, "31/2-2").is_none());
}

#[tokio::test]
async fn test_repeated_pair_yields_single_edge() {
    let dir = fixture_dir();
    let mut run = coordinator(MemoryGraph::new());
    run.import_dir(dir.path()).await.unwrap();

    let edges: Vec<_> = run.store().edges_of(Relation::HasWellbore).collect();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].from, NodeKey::new(Label::Well, "31/2-1"));
    assert_eq!(edges[0].to, NodeKey::new(Label::Wellbore, "31/2-1 A"));
}

#[tokio::test]
async fn test_reimport_keeps_counts() {
    let dir = fixture_dir();
    let mut first = coordinator(MemoryGraph::new());
    let before = first.import_dir(dir.path()).await.unwrap().counts.unwrap();

    let mut second = coordinator(first.into_store());
    let after = second.import_dir(dir.path()).await.unwrap().counts.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_marker_turns_second_run_into_noop() {
    let dir = fixture_dir();
    let marker_path = dir.path().join("state").join("initialized");

    let mut marker = CompletionMarker::load(&marker_path).unwrap();
    let mut first = coordinator(MemoryGraph::new());
    let outcome = first.run(dir.path(), &mut marker).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert!(marker_path.is_file());

    let mut reloaded = CompletionMarker::load(&marker_path).unwrap();
    assert!(reloaded.is_complete());
    let mut second = coordinator(MemoryGraph::new());
    let outcome = second.run(dir.path(), &mut reloaded).await.unwrap();
    match outcome {
        RunOutcome::AlreadyComplete(Some(record)) => {
            assert_eq!(record.summary.failed_rows(), 0);
        }
        other => panic!("expected a recorded completion, got {other:?}"),
    }
    assert_eq!(second.store().write_calls(), (0, 0));
}

#[tokio::test]
async fn test_missing_source_fails_before_any_write() {
    let dir = fixture_dir();
    fs::remove_file(dir.path().join("field.csv")).unwrap();
    let marker_path = dir.path().join("initialized");
    let mut marker = CompletionMarker::load(&marker_path).unwrap();

    let mut run = coordinator(MemoryGraph::new());
    let err = run.run(dir.path(), &mut marker).await.unwrap_err();
    assert!(matches!(
        err,
        ImportError::Source(SourceError::MissingFile { .. })
    ));
    assert_eq!(run.store().write_calls(), (0, 0));
    assert!(!run.store().is_constrained(Label::License));
    assert!(!marker_path.exists());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let dir = fixture_dir();
    let marker_path = dir.path().join("initialized");
    let mut marker = CompletionMarker::load(&marker_path).unwrap();

    let mut run = coordinator(FlakyStore::failing_transiently(2));
    let outcome = run.run(dir.path(), &mut marker).await.unwrap();
    let RunOutcome::Completed(summary) = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(summary.failed_rows(), 0);
    assert!(marker.is_complete());

    let mut baseline = coordinator(MemoryGraph::new());
    let expected = baseline.import_dir(dir.path()).await.unwrap().counts;
    assert_eq!(summary.counts, expected);
}

#[tokio::test]
async fn test_rejected_row_blocks_marker_but_not_run() {
    let dir = fixture_dir();
    let marker_path = dir.path().join("initialized");
    let mut marker = CompletionMarker::load(&marker_path).unwrap();

    let mut run = coordinator(FlakyStore::rejecting(Label::Wellbore, "31/2-1 A"));
    let outcome = run.run(dir.path(), &mut marker).await.unwrap();
    let RunOutcome::Incomplete(summary) = outcome else {
        panic!("expected an incomplete run, got {outcome:?}");
    };

    let wellbores = summary.file(SourceKind::Wellbore).unwrap();
    assert_eq!(wellbores.failed_rows, 2);
    assert_eq!(wellbores.rows_imported, 2);
    assert!(!marker.is_complete());
    assert!(!marker_path.exists());

    let store = &run.store().inner;
    assert!(store.node(Label::Wellbore, "31/4-1").is_some());
    assert!(store.node(Label::Wellbore, "31/2-1 A").is_none());
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_row() {
    let dir = fixture_dir();
    let mut run = RunCoordinator::with_policy(
        FlakyStore::failing_transiently(2),
        RetryPolicy::no_delay(2),
        0,
    );
    let summary = run.import_dir(dir.path()).await.unwrap();

    let licences = summary.file(SourceKind::Licence).unwrap();
    assert_eq!(licences.failed_rows, 1);
    assert_eq!(licences.rows_imported, 1);
    let node_writes: u64 = summary.files.iter().map(|f| f.node_writes).sum();
    assert_eq!(u64::from(run.store().attempts), node_writes + 2);
}

#[tokio::test]
async fn test_read_failure_mid_file_is_fatal() {
    let cut = LICENCE_CSV.find("PL050").unwrap();
    let reader = RowReader::from_reader(
        Path::new("licence.csv"),
        FailingReader::new(LICENCE_CSV, cut),
    )
    .unwrap();

    let mut run = coordinator(MemoryGraph::new());
    let err = run
        .import_rows(SourceKind::Licence, reader)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Source(SourceError::Read { .. })));
    assert!(run.store().node(Label::License, "PL001").is_some());
    assert!(run.store().node(Label::License, "PL050").is_none());
}
