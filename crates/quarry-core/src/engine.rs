//! Corpus engine.
//!
//! [`CorpusEngine`] is the main entry point: it owns the configuration, the
//! chunker, the lexical scorer, the embedding backend, and the corpus state
//! behind an `RwLock`. Searches take read guards and may run concurrently;
//! ingestion and removal mutate under the write guard, and rebuilds are
//! constructed entirely off-lock and published by swapping the whole
//! [`Corpus`] value, so in-flight reads never observe a partially rebuilt
//! index.
//!
//! All calls are synchronous and blocking. Concurrency across documents or
//! queries is the caller's responsibility; the engine itself is not safe
//! for concurrent writers beyond the serialization the lock provides.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use quarry_store::Corpus;

use crate::chunker::SemanticChunker;
use crate::config::CorpusConfig;
use crate::embedding::{check_backend_dimension, check_embeddings, EmbeddingBackend};
use crate::errors::QuarryError;
use crate::lexical::LexicalScorer;
use crate::types::{CorpusStats, DocumentSummary};

/// The corpus engine: ingestion, search, and lifecycle for one corpus.
pub struct CorpusEngine {
    pub(crate) config: CorpusConfig,
    pub(crate) dir: PathBuf,
    pub(crate) chunker: SemanticChunker,
    pub(crate) lexical: LexicalScorer,
    pub(crate) embedder: Box<dyn EmbeddingBackend>,
    pub(crate) state: RwLock<Corpus>,
}

impl CorpusEngine {
    /// Open (or create) a corpus under `dir`.
    ///
    /// Validates the configuration, checks that the embedder's dimension
    /// agrees with the configured index dimension, and loads the persisted
    /// corpus when one exists. A persisted corpus whose artifacts disagree
    /// with each other fails here, fast; it is never silently truncated or
    /// repaired.
    pub fn open(
        dir: impl Into<PathBuf>,
        config: CorpusConfig,
        embedder: Box<dyn EmbeddingBackend>,
    ) -> Result<Self, QuarryError> {
        for warning in config.validate()? {
            warn!("{}", warning);
        }
        check_backend_dimension(embedder.as_ref(), config.dimension)?;

        let dir = dir.into();
        let corpus = if Corpus::exists(&dir) {
            Corpus::load(&dir, config.dimension)?
        } else {
            info!(
                "No corpus found at {}; starting empty (dimension {})",
                dir.display(),
                config.dimension
            );
            Corpus::empty(config.dimension)
        };

        Ok(Self {
            chunker: SemanticChunker::new(config.chunker),
            lexical: LexicalScorer::new(config.lexical),
            config,
            dir,
            embedder,
            state: RwLock::new(corpus),
        })
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// The directory holding the persisted corpus artifacts.
    pub fn corpus_dir(&self) -> &Path {
        &self.dir
    }

    /// Corpus-wide statistics.
    pub fn stats(&self) -> Result<CorpusStats, QuarryError> {
        let state = self.read_state()?;
        Ok(CorpusStats {
            documents: state.registry.len(),
            chunks: state.chunks.len(),
            vectors: state.index.row_count(),
            dimension: self.config.dimension,
            document_summaries: state
                .registry
                .iter()
                .map(|entry| DocumentSummary {
                    doc_id: entry.doc_id.clone(),
                    name: entry.name.clone(),
                    num_chunks: entry.chunk_ids.len(),
                    updated_at: entry.updated_at,
                })
                .collect(),
        })
    }

    /// Reset the corpus to empty and persist the empty state.
    pub fn clear(&self) -> Result<(), QuarryError> {
        let empty = Corpus::empty(self.config.dimension);
        let mut state = self.write_state()?;
        *state = empty;
        self.persist(&state)?;
        info!("Cleared corpus at {}", self.dir.display());
        Ok(())
    }

    pub(crate) fn read_state(&self) -> Result<RwLockReadGuard<'_, Corpus>, QuarryError> {
        self.state
            .read()
            .map_err(|e| QuarryError::internal(format!("corpus lock poisoned: {}", e)))
    }

    pub(crate) fn write_state(&self) -> Result<RwLockWriteGuard<'_, Corpus>, QuarryError> {
        self.state
            .write()
            .map_err(|e| QuarryError::internal(format!("corpus lock poisoned: {}", e)))
    }

    /// Persist a corpus snapshot to the engine's directory.
    pub(crate) fn persist(&self, corpus: &Corpus) -> Result<(), QuarryError> {
        corpus.save(&self.dir)?;
        Ok(())
    }

    /// Embed a batch of texts and validate the result against the index
    /// dimension before it can touch the store.
    pub(crate) fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, QuarryError> {
        let embeddings = self.embedder.embed_batch(texts)?;
        check_embeddings(&embeddings, texts.len(), self.config.dimension)?;
        Ok(embeddings)
    }
}
