//! Chunk metadata store.
//!
//! Maps dense vector row ids to chunk text, offsets, and provenance. The
//! store is a `Vec<ChunkRecord>` whose position IS the row id, which makes
//! the one-to-one chunk/vector invariant structural: the store and the
//! index are consistent exactly when their lengths agree.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bincode::{config, Decode, Encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Filename for the serialized chunk store.
pub const CHUNKS_FILENAME: &str = "chunks.bin";

/// Current snapshot schema version.
const SCHEMA_VERSION: u32 = 1;

/// Metadata for a single indexed chunk.
///
/// Immutable once created; a chunk is owned exclusively by its document and
/// disappears with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ChunkRecord {
    /// Corpus-unique chunk identifier (`{doc_id}_chunk_{ordinal}`).
    pub chunk_id: String,

    /// Owning document id.
    pub doc_id: String,

    /// Owning document display name.
    pub doc_name: String,

    /// Position of this chunk within its document.
    pub ordinal: u32,

    /// Chunk text.
    pub text: String,

    /// Start offset within the normalized document text.
    pub start_offset: u64,

    /// End offset within the normalized document text.
    pub end_offset: u64,

    /// Source page number, when the loader provides one.
    pub page_number: Option<u32>,

    /// Source section label, when the loader provides one.
    pub section: Option<String>,
}

/// On-disk snapshot of the chunk store.
#[derive(Debug, Encode, Decode)]
struct ChunkSnapshot {
    version: u32,
    records: Vec<ChunkRecord>,
}

/// Dense store of chunk metadata addressed by vector row id.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    records: Vec<ChunkRecord>,
}

impl ChunkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records already ordered by row id.
    pub fn from_records(records: Vec<ChunkRecord>) -> Self {
        Self { records }
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the chunk for a row id.
    pub fn get(&self, row_id: usize) -> Option<&ChunkRecord> {
        self.records.get(row_id)
    }

    /// Append a record, returning its assigned row id.
    pub fn push(&mut self, record: ChunkRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Iterate over `(row_id, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChunkRecord)> {
        self.records.iter().enumerate()
    }

    /// All records belonging to a document, in ordinal order.
    pub fn records_for_doc(&self, doc_id: &str) -> Vec<&ChunkRecord> {
        self.records
            .iter()
            .filter(|r| r.doc_id == doc_id)
            .collect()
    }

    /// Chunks of the same document whose ordinal lies within
    /// `window` of `ordinal`, excluding the chunk itself.
    pub fn neighbors(&self, doc_id: &str, ordinal: u32, window: u32) -> Vec<&ChunkRecord> {
        self.records
            .iter()
            .filter(|r| {
                r.doc_id == doc_id
                    && r.ordinal != ordinal
                    && r.ordinal.abs_diff(ordinal) <= window
            })
            .collect()
    }

    /// Save the store to `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let file = fs::File::create(path).map_err(|e| {
            StoreError::snapshot_io(path, format!("failed to create chunk store: {}", e))
        })?;
        let mut writer = BufWriter::new(file);

        let snapshot = ChunkSnapshot {
            version: SCHEMA_VERSION,
            records: self.records.clone(),
        };

        bincode::encode_into_std_write(&snapshot, &mut writer, config::standard()).map_err(
            |e| StoreError::snapshot_parse(path, format!("failed to serialize chunk store: {}", e)),
        )?;

        debug!("Saved {} chunk records to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a store from `path`, failing fast on schema mismatch.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let file = fs::File::open(path).map_err(|e| {
            StoreError::snapshot_io(path, format!("failed to open chunk store: {}", e))
        })?;
        let mut reader = BufReader::new(file);

        let snapshot: ChunkSnapshot =
            bincode::decode_from_std_read(&mut reader, config::standard()).map_err(|e| {
                StoreError::snapshot_parse(path, format!("failed to deserialize chunk store: {}", e))
            })?;

        if snapshot.version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersionMismatch {
                path: path.to_path_buf(),
                found: snapshot.version,
                expected: SCHEMA_VERSION,
            });
        }

        debug!(
            "Loaded {} chunk records from {}",
            snapshot.records.len(),
            path.display()
        );

        Ok(Self {
            records: snapshot.records,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
