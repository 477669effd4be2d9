//! Co-versioned corpus state.
//!
//! The three persisted artifacts (vector index, chunk metadata, document
//! registry) are only meaningful together, so they load and save as one
//! [`Corpus`] value. Storage layout:
//!
//! ```text
//! <corpus dir>/
//! ├── vectors.bin    # FlatVectorIndex snapshot (schema version + row count)
//! ├── chunks.bin     # ChunkStore snapshot, dense by vector row id
//! ├── registry.json  # DocumentRegistry, keyed by doc_id
//! └── meta.json      # Summary: schema version, counts, built-at
//! ```
//!
//! Save order is registry, chunks, then index, so a crash mid-save can at
//! worst leave an index older than its metadata; the load-time consistency
//! check catches every partial-write combination and fails fast rather than
//! silently truncating.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunks::{ChunkStore, CHUNKS_FILENAME};
use crate::error::{StoreError, StoreResult};
use crate::registry::{DocumentRegistry, REGISTRY_FILENAME};
use crate::vector::{FlatVectorIndex, VECTORS_FILENAME};

/// Filename for the corpus summary.
pub const META_FILENAME: &str = "meta.json";

/// Current corpus schema version.
const SCHEMA_VERSION: u32 = 1;

/// Summary metadata written alongside the corpus artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusMeta {
    /// Corpus schema version for compatibility checks.
    pub version: u32,
    /// Embedding dimension of the index.
    pub dimension: usize,
    /// Number of registered documents.
    pub documents: usize,
    /// Number of chunks (== index row count).
    pub chunks: usize,
    /// Timestamp when the corpus was last saved (Unix epoch seconds).
    pub saved_at: u64,
}

/// The three co-versioned artifacts as a single value.
///
/// A `Corpus` is a plain value: callers wrap it in a lock and publish
/// rebuilt instances by swapping the whole value, so concurrent readers
/// never observe a partially rebuilt state.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Append-only flat embedding index.
    pub index: FlatVectorIndex,

    /// Chunk metadata, dense by vector row id.
    pub chunks: ChunkStore,

    /// Document registry, keyed by doc_id.
    pub registry: DocumentRegistry,
}

impl Corpus {
    /// Create an empty corpus for the given embedding dimension.
    pub fn empty(dimension: usize) -> Self {
        Self {
            index: FlatVectorIndex::new(dimension),
            chunks: ChunkStore::new(),
            registry: DocumentRegistry::new(),
        }
    }

    /// Verify the cross-artifact invariants.
    ///
    /// Every chunk has exactly one vector row and vice versa, and the
    /// registry accounts for every chunk. Failure is fatal for callers:
    /// it means the persisted artifacts were written out of step.
    pub fn verify(&self) -> StoreResult<()> {
        let rows = self.index.row_count();
        let chunks = self.chunks.len();
        if rows != chunks {
            return Err(StoreError::corrupt(format!(
                "index holds {} rows but chunk store holds {} records",
                rows, chunks
            )));
        }

        let registered = self.registry.total_chunks();
        if registered != chunks {
            return Err(StoreError::corrupt(format!(
                "registry accounts for {} chunks but chunk store holds {}",
                registered, chunks
            )));
        }

        Ok(())
    }

    /// Check whether a persisted corpus exists under `dir`.
    pub fn exists(dir: &Path) -> bool {
        dir.join(VECTORS_FILENAME).exists()
    }

    /// Load a corpus from `dir`.
    ///
    /// `dimension` is the dimension the caller's embedder produces; a
    /// persisted index with a different dimension is a configuration error.
    /// The cross-artifact consistency check runs before anything is
    /// returned, and disagreement is fatal; repair requires an explicit
    /// rebuild.
    pub fn load(dir: &Path, dimension: usize) -> StoreResult<Self> {
        let index = FlatVectorIndex::load(&dir.join(VECTORS_FILENAME))?;
        if index.dimension() != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: index.dimension(),
            });
        }

        let chunks = ChunkStore::load(&dir.join(CHUNKS_FILENAME))?;
        let registry = DocumentRegistry::load(&dir.join(REGISTRY_FILENAME))?;

        let corpus = Self {
            index,
            chunks,
            registry,
        };
        corpus.verify()?;

        info!(
            "Loaded corpus from {}: {} documents, {} chunks, dimension {}",
            dir.display(),
            corpus.registry.len(),
            corpus.chunks.len(),
            dimension
        );
        Ok(corpus)
    }

    /// Save all artifacts under `dir`, creating it if needed.
    ///
    /// Registry and chunk metadata are written before the index.
    pub fn save(&self, dir: &Path) -> StoreResult<()> {
        fs::create_dir_all(dir).map_err(|e| {
            StoreError::snapshot_io(dir, format!("failed to create corpus directory: {}", e))
        })?;

        self.registry.save(&dir.join(REGISTRY_FILENAME))?;
        self.chunks.save(&dir.join(CHUNKS_FILENAME))?;
        self.index.save(&dir.join(VECTORS_FILENAME))?;

        let meta = CorpusMeta {
            version: SCHEMA_VERSION,
            dimension: self.index.dimension(),
            documents: self.registry.len(),
            chunks: self.chunks.len(),
            saved_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let meta_json = serde_json::to_string_pretty(&meta)?;
        fs::write(dir.join(META_FILENAME), meta_json).map_err(|e| {
            StoreError::snapshot_io(dir, format!("failed to write corpus meta: {}", e))
        })?;

        debug!(
            "Saved corpus to {}: {} documents, {} chunks",
            dir.display(),
            self.registry.len(),
            self.chunks.len()
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
