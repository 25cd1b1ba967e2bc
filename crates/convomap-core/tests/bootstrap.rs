//! Bootstrap-path integration tests.

use std::sync::Arc;

use convomap_core::{SyncEngine, SyncOptions, SyncOutcome};
use convomap_test_utils::{
    conversation, historical_rows, FixedEmbedder, RecordingReporter, StubConversationStore,
    StubIndexService,
};
use pretty_assertions::assert_eq;

const COURSE: &str = "cs101";

struct Harness {
    index: StubIndexService,
    embedder: FixedEmbedder,
    reporter: RecordingReporter,
    engine: SyncEngine,
}

fn harness(rows: usize) -> Harness {
    let index = StubIndexService::new();
    let embedder = FixedEmbedder::new(8);
    let reporter = RecordingReporter::new();
    let engine = SyncEngine::new(
        Arc::new(StubConversationStore::new(historical_rows(rows))),
        Arc::new(embedder.clone()),
        Arc::new(index.clone()),
        Arc::new(reporter.clone()),
        SyncOptions::default(),
    );
    Harness {
        index,
        embedder,
        reporter,
        engine,
    }
}

/// A missing index diverts to the bootstrap path exactly once; the
/// incremental path is not retried.
#[tokio::test]
async fn not_configured_switches_to_bootstrap_once() {
    let h = harness(19);
    let convo = conversation("conv-new", "student@example.edu", &[("user", "latest query")]);

    let outcome = h.engine.sync_conversation(COURSE, &convo).await;
    assert_eq!(
        outcome,
        SyncOutcome::Created {
            course: COURSE.to_string()
        }
    );
    assert_eq!(h.index.open_calls(), 1);
    assert_eq!(h.index.bulk_creates(), 1);
    assert_eq!(h.reporter.report_count(), 0);
}

/// A new triggering conversation appends a 20th record; row ids run 1..=20.
#[tokio::test]
async fn bootstrap_appends_new_triggering_conversation() {
    let h = harness(19);
    let convo = conversation("conv-new", "student@example.edu", &[("user", "latest query")]);

    h.engine.sync_conversation(COURSE, &convo).await;

    let records = h.index.records(COURSE);
    assert_eq!(records.len(), 20);
    let row_ids: Vec<i64> = records.iter().map(|r| r.row_id).collect();
    assert_eq!(row_ids, (1..=20).collect::<Vec<_>>());
    assert_eq!(records[19].conversation_id, "conv-new");
    assert_eq!(records[19].first_query, "latest query");

    // Embeddings for the whole index were computed in one batch call.
    let calls = h.embedder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 20);
    assert_eq!(calls[0][19], "latest query");
}

/// A triggering conversation matching a historical row merges into that
/// row's transcript instead of duplicating it.
#[tokio::test]
async fn bootstrap_merges_matching_triggering_conversation() {
    let h = harness(19);
    let convo = conversation(
        "conv-3",
        "user3@example.edu",
        &[("user", "one more question"), ("assistant", "one more answer")],
    );

    let outcome = h.engine.sync_conversation(COURSE, &convo).await;
    assert_eq!(
        outcome,
        SyncOutcome::Created {
            course: COURSE.to_string()
        }
    );

    let records = h.index.records(COURSE);
    assert_eq!(records.len(), 19);
    let merged = records
        .iter()
        .find(|r| r.conversation_id == "conv-3")
        .expect("merged row");
    assert!(merged.transcript.contains(">>> 🙋 user: query 3"));
    assert!(merged.transcript.contains(">>> 🙋 user: one more question"));
}

/// Below the volume threshold nothing is created and nothing is reported.
#[tokio::test]
async fn bootstrap_defers_below_threshold() {
    let h = harness(18);
    let convo = conversation("conv-new", "student@example.edu", &[("user", "latest query")]);

    let outcome = h.engine.sync_conversation(COURSE, &convo).await;
    assert_eq!(
        outcome,
        SyncOutcome::Deferred {
            course: COURSE.to_string()
        }
    );
    assert_eq!(h.index.bulk_creates(), 0);
    assert_eq!(h.embedder.call_count(), 0);
    assert_eq!(h.reporter.report_count(), 0);
}
