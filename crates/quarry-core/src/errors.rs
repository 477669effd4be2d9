//! Error types for quarry-core.

use thiserror::Error;

/// Domain-specific errors for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// A configuration value is invalid.
    ///
    /// Used for validation errors detected at runtime (e.g., chunk_size=0).
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    /// The embedder's dimension does not match the configured index dimension.
    ///
    /// Fatal: a mismatched embedder would write unusable vectors. Checked at
    /// engine construction and before every index write.
    #[error("Embedding dimension mismatch: index expects {expected}, embedder produces {actual}")]
    EmbeddingDimensionMismatch {
        /// Dimension the index was created with.
        expected: usize,
        /// Dimension the embedder reports or produced.
        actual: usize,
    },

    /// The embedding call itself failed.
    #[error("Embedding failed: {message}")]
    EmbeddingFailed {
        /// Description of the failure.
        message: String,
    },

    /// Ingestion of a single document failed.
    ///
    /// Isolated to that document; batch ingestion records the failure and
    /// continues with the next document.
    #[error("Failed to ingest document `{doc_id}`: {reason}")]
    IngestionFailed {
        /// The document that failed.
        doc_id: String,
        /// Description of the failure.
        reason: String,
    },

    /// Storage layer error (index, chunk store, registry, snapshots).
    #[error(transparent)]
    Store(#[from] quarry_store::StoreError),

    /// Internal invariant violation (e.g., poisoned lock).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuarryError {
    /// Create an embedding-failed error.
    pub fn embedding_failed(message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            message: message.into(),
        }
    }

    /// Create a per-document ingestion error.
    pub fn ingestion_failed(doc_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IngestionFailed {
            doc_id: doc_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
