//! Ingestion pipeline.
//!
//! Orchestrates chunking, embedding, and store updates for loader-produced
//! documents with skip/replace/fail semantics:
//!
//! - unchanged content hash → `Skipped`, nothing written
//! - new document → chunks embedded and appended, `Added`
//! - changed content → old chunks removed (which rebuilds the flat index
//!   from re-embedded survivors), new chunks appended, `Replaced`
//!
//! Ingestion is all-or-nothing per document: chunking and embedding happen
//! before any store mutation, so a failure leaves the registry and index
//! untouched. Batch ingestion isolates per-document failures and reports
//! aggregate counters instead of aborting the run.

use chrono::Utc;
use tracing::{info, warn};

use quarry_store::{ChunkRecord, ChunkStore, Corpus, DocumentEntry, FlatVectorIndex};

use crate::engine::CorpusEngine;
use crate::errors::QuarryError;
use crate::types::{IngestReport, IngestStatus, SourceDocument};

impl CorpusEngine {
    /// Ingest a single document.
    ///
    /// Returns the outcome for the document; failures are errors here and
    /// become `failed` entries in [`CorpusEngine::ingest_all`] reports.
    pub fn ingest(&self, doc: &SourceDocument) -> Result<IngestStatus, QuarryError> {
        let replacing = {
            let state = self.read_state()?;
            if state.registry.contains(&doc.doc_id)
                && !state.registry.is_changed(&doc.doc_id, &doc.content_hash)
            {
                info!("Document `{}` unchanged; skipping", doc.doc_id);
                return Ok(IngestStatus::Skipped);
            }
            state.registry.contains(&doc.doc_id)
        };

        let chunks = self.chunker.split(doc);
        if chunks.is_empty() {
            return Err(QuarryError::ingestion_failed(
                &doc.doc_id,
                "document produced no chunks",
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embed_texts(&texts)?;

        if replacing {
            // Content changed: replace = remove + re-add. The post-removal
            // corpus is assembled off to the side and published in one swap.
            let created_at = self
                .read_state()?
                .registry
                .get(&doc.doc_id)
                .map(|entry| entry.created_at);

            let mut next = self.rebuild_without(&doc.doc_id)?;
            append_document(&mut next, doc, chunks, &embeddings, created_at)?;

            let mut state = self.write_state()?;
            *state = next;
            self.persist(&state)?;
            info!(
                "Replaced document `{}` ({} chunks, {} total rows)",
                doc.doc_id,
                texts.len(),
                state.index.row_count()
            );
            Ok(IngestStatus::Replaced)
        } else {
            let mut state = self.write_state()?;
            append_document(&mut state, doc, chunks, &embeddings, None)?;
            self.persist(&state)?;
            info!(
                "Added document `{}` ({} chunks, {} total rows)",
                doc.doc_id,
                texts.len(),
                state.index.row_count()
            );
            Ok(IngestStatus::Added)
        }
    }

    /// Ingest a batch of documents, accumulating counters.
    ///
    /// A failing document is recorded and the batch continues with the
    /// next one.
    pub fn ingest_all(&self, docs: &[SourceDocument]) -> IngestReport {
        let mut report = IngestReport::default();
        for doc in docs {
            match self.ingest(doc) {
                Ok(status) => report.record(status),
                Err(e) => {
                    warn!("Ingestion of `{}` failed: {}", doc.doc_id, e);
                    report.record_failure(&doc.doc_id, e.to_string());
                }
            }
        }
        info!(
            "Ingestion complete. Success: {}, Failed: {}, Skipped: {}",
            report.success, report.failed, report.skipped
        );
        report
    }

    /// Remove a document and all its chunks.
    ///
    /// Returns `false` when the document is not registered. Removal rebuilds
    /// the flat index from the surviving chunks with freshly regenerated
    /// embeddings, since the index has no delete operation and embeddings
    /// are not persisted independently of it.
    pub fn remove(&self, doc_id: &str) -> Result<bool, QuarryError> {
        {
            let state = self.read_state()?;
            if !state.registry.contains(doc_id) {
                warn!("Document `{}` not found in registry", doc_id);
                return Ok(false);
            }
        }

        let next = self.rebuild_without(doc_id)?;

        let mut state = self.write_state()?;
        let removed_chunks = state.chunks.len().saturating_sub(next.chunks.len());
        *state = next;
        self.persist(&state)?;
        info!(
            "Removed document `{}` and {} chunks ({} rows remain)",
            doc_id,
            removed_chunks,
            state.index.row_count()
        );
        Ok(true)
    }

    /// Build a corpus without `doc_id`, re-embedding the survivors.
    ///
    /// Runs entirely off-lock; once started it runs to completion and the
    /// caller publishes the result with a single swap under the write lock.
    fn rebuild_without(&self, doc_id: &str) -> Result<Corpus, QuarryError> {
        let (survivors, registry) = {
            let state = self.read_state()?;
            let survivors: Vec<ChunkRecord> = state
                .chunks
                .iter()
                .filter(|(_, record)| record.doc_id != doc_id)
                .map(|(_, record)| record.clone())
                .collect();
            let mut registry = state.registry.clone();
            registry.remove(doc_id);
            (survivors, registry)
        };

        let embeddings = if survivors.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = survivors.iter().map(|r| r.text.clone()).collect();
            self.embed_texts(&texts)?
        };

        let index = FlatVectorIndex::from_rows(self.config.dimension, embeddings)?;
        Ok(Corpus {
            index,
            chunks: ChunkStore::from_records(survivors),
            registry,
        })
    }
}

/// Append a chunked, embedded document to a corpus.
fn append_document(
    corpus: &mut Corpus,
    doc: &SourceDocument,
    chunks: Vec<ChunkRecord>,
    embeddings: &[Vec<f32>],
    created_at: Option<chrono::DateTime<Utc>>,
) -> Result<(), QuarryError> {
    corpus.index.add(embeddings)?;

    let chunk_ids: Vec<String> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
    for chunk in chunks {
        corpus.chunks.push(chunk);
    }

    let now = Utc::now();
    corpus.registry.upsert(DocumentEntry {
        doc_id: doc.doc_id.clone(),
        name: doc.name.clone(),
        path: doc.path.clone(),
        content_hash: doc.content_hash.clone(),
        chunk_ids,
        created_at: created_at.unwrap_or(now),
        updated_at: now,
    });

    Ok(())
}
