//! Error types for quarry-store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for quarry-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in quarry-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    // ========================================================================
    // Vector index errors
    // ========================================================================
    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Snapshot I/O error.
    #[error("Snapshot I/O error at {path}: {message}")]
    SnapshotIo { path: PathBuf, message: String },

    /// Snapshot parse error.
    #[error("Snapshot parse error at {path}: {message}")]
    SnapshotParse { path: PathBuf, message: String },

    /// Snapshot schema version mismatch.
    #[error("Snapshot schema version mismatch at {path}: found {found}, expected {expected}")]
    SchemaVersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    // ========================================================================
    // Consistency errors
    // ========================================================================
    /// The persisted artifacts disagree with each other.
    ///
    /// Raised at load time when the index row count, chunk metadata, and
    /// document registry do not line up. Never auto-repaired; recovering
    /// requires an explicit rebuild.
    #[error("Corpus state is corrupt: {reason}")]
    Corrupt { reason: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a snapshot I/O error.
    pub fn snapshot_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SnapshotIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a snapshot parse error.
    pub fn snapshot_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SnapshotParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a corrupt-state error.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }
}
