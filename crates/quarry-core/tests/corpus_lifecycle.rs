//! Ingestion lifecycle: dedup, replacement, removal, persistence.

mod common;

use common::{doc, open_engine, paragraphs, DIMENSION};
use quarry_core::{CorpusEngine, IngestStatus, QuarryError, SearchMode, StoreError};
use tempfile::TempDir;

#[test]
fn ingest_is_idempotent_for_unchanged_content() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(temp_dir.path());

    let document = doc("guide", &paragraphs(4, "packet collection"), "hash-1");
    assert_eq!(engine.ingest(&document).unwrap(), IngestStatus::Added);

    let stats_before = engine.stats().unwrap();
    assert!(stats_before.chunks > 0);
    assert_eq!(stats_before.chunks, stats_before.vectors);

    // Second ingestion with the identical hash is a no-op.
    assert_eq!(engine.ingest(&document).unwrap(), IngestStatus::Skipped);

    let stats_after = engine.stats().unwrap();
    assert_eq!(stats_after.documents, stats_before.documents);
    assert_eq!(stats_after.chunks, stats_before.chunks);
    assert_eq!(stats_after.vectors, stats_before.vectors);
}

#[test]
fn changed_content_replaces_old_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(temp_dir.path());

    engine
        .ingest(&doc("guide", &paragraphs(4, "obsolete frobnicator"), "hash-1"))
        .unwrap();
    engine
        .ingest(&doc("other", &paragraphs(3, "unrelated material"), "hash-x"))
        .unwrap();

    let status = engine
        .ingest(&doc("guide", &paragraphs(5, "replacement telemetry"), "hash-2"))
        .unwrap();
    assert_eq!(status, IngestStatus::Replaced);

    let stats = engine.stats().unwrap();
    // Index rows equal the corpus-wide chunk total.
    assert_eq!(stats.chunks, stats.vectors);
    let registered: usize = stats
        .document_summaries
        .iter()
        .map(|s| s.num_chunks)
        .sum();
    assert_eq!(registered, stats.chunks);

    // The old content is unreachable, the new content is indexed.
    let old = engine.search("obsolete frobnicator", 10, SearchMode::Keyword).unwrap();
    assert!(old.is_empty());
    let new = engine.search("replacement telemetry", 10, SearchMode::Keyword).unwrap();
    assert!(!new.is_empty());
    assert!(new.iter().all(|hit| hit.chunk.doc_id == "guide"));
}

#[test]
fn remove_rebuilds_index_to_exact_survivor_count() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(temp_dir.path());

    engine
        .ingest(&doc("alpha", &paragraphs(4, "alpha quorum voting"), "hash-a"))
        .unwrap();
    engine
        .ingest(&doc("beta", &paragraphs(3, "beta snapshot shipping"), "hash-b"))
        .unwrap();

    let before = engine.stats().unwrap();
    let beta_chunks = before
        .document_summaries
        .iter()
        .find(|s| s.doc_id == "beta")
        .unwrap()
        .num_chunks;

    assert!(engine.remove("beta").unwrap());

    let after = engine.stats().unwrap();
    assert_eq!(after.documents, before.documents - 1);
    assert_eq!(after.chunks, before.chunks - beta_chunks);
    assert_eq!(after.vectors, after.chunks);

    // The removed document no longer matches anything.
    let hits = engine
        .search("beta snapshot shipping", 10, SearchMode::Keyword)
        .unwrap();
    assert!(hits.is_empty());

    // Removing an unknown document reports false, not an error.
    assert!(!engine.remove("beta").unwrap());
    assert!(!engine.remove("never-ingested").unwrap());
}

#[test]
fn batch_ingestion_accumulates_counters_and_continues() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(temp_dir.path());

    engine
        .ingest(&doc("known", &paragraphs(3, "already present"), "hash-k"))
        .unwrap();

    let batch = vec![
        doc("fresh", &paragraphs(3, "fresh content"), "hash-f"),
        doc("known", &paragraphs(3, "already present"), "hash-k"), // unchanged
        doc("empty", "", "hash-e"),                                // fails: no chunks
    ];
    let report = engine.ingest_all(&batch);

    assert_eq!(report.total, 3);
    assert_eq!(report.success, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].doc_id, "empty");

    // The failing document left no partial writes behind.
    let stats = engine.stats().unwrap();
    assert!(stats.document_summaries.iter().all(|s| s.doc_id != "empty"));
    assert_eq!(stats.chunks, stats.vectors);
}

#[test]
fn corpus_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let chunks = {
        let engine = open_engine(temp_dir.path());
        engine
            .ingest(&doc("persisted", &paragraphs(4, "durable state"), "hash-p"))
            .unwrap();
        engine.stats().unwrap().chunks
    };

    let reopened = open_engine(temp_dir.path());
    let stats = reopened.stats().unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.chunks, chunks);
    assert_eq!(stats.vectors, chunks);

    let hits = reopened
        .search("durable state", 5, SearchMode::Keyword)
        .unwrap();
    assert!(!hits.is_empty());
}

#[test]
fn reopen_fails_fast_when_artifacts_disagree() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_engine(temp_dir.path());
        engine
            .ingest(&doc("victim", &paragraphs(4, "soon inconsistent"), "hash-v"))
            .unwrap();
    }

    // Overwrite the index with one that has a different row count, as a
    // partial write would.
    let stale = quarry_core::Corpus::empty(DIMENSION);
    stale
        .index
        .save(&temp_dir.path().join(quarry_store::VECTORS_FILENAME))
        .unwrap();

    let result = CorpusEngine::open(
        temp_dir.path(),
        common::test_config(),
        Box::new(common::HashEmbeddingBackend::new(DIMENSION)),
    );
    match result {
        Err(QuarryError::Store(StoreError::Corrupt { .. })) => {}
        other => panic!("expected corrupt-state error, got {:?}", other.err()),
    }
}

#[test]
fn clear_resets_everything() {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(temp_dir.path());

    engine
        .ingest(&doc("gone", &paragraphs(3, "ephemeral content"), "hash-g"))
        .unwrap();
    engine.clear().unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.documents, 0);
    assert_eq!(stats.chunks, 0);
    assert_eq!(stats.vectors, 0);
    assert!(engine
        .search("ephemeral content", 5, SearchMode::Hybrid)
        .unwrap()
        .is_empty());

    // The cleared state is what a reopen sees.
    drop(engine);
    let reopened = open_engine(temp_dir.path());
    assert_eq!(reopened.stats().unwrap().chunks, 0);
}
