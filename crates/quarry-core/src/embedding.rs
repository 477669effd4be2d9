//! Embedding boundary.
//!
//! The embedding model is an external collaborator: Quarry consumes it as a
//! black-box function from text to fixed-dimension vectors, agreed at index
//! creation time. Calls are blocking and dominate ingestion/query latency;
//! retries, timeouts, and batching strategy belong to the backend
//! implementation, not to this crate.

use crate::errors::QuarryError;

/// Trait for embedding providers.
pub trait EmbeddingBackend: Send + Sync {
    /// Get the embedding dimension this backend produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of text inputs.
    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, QuarryError>;

    /// Embed a single text input.
    fn embed(&self, input: &str) -> Result<Vec<f32>, QuarryError> {
        let results = self.embed_batch(&[input.to_string()])?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| QuarryError::embedding_failed("embed_batch returned empty results"))
    }
}

/// Verify that a backend agrees with the configured index dimension.
///
/// A mismatch is a configuration error and fatal: vectors of the wrong
/// dimension must never reach the index.
pub fn check_backend_dimension(
    backend: &dyn EmbeddingBackend,
    expected: usize,
) -> Result<(), QuarryError> {
    let actual = backend.dimension();
    if actual != expected {
        return Err(QuarryError::EmbeddingDimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Validate an embedding batch before it is handed to the index.
///
/// Checks that the backend returned one vector per input and that every
/// vector has the expected dimension.
pub fn check_embeddings(
    embeddings: &[Vec<f32>],
    inputs: usize,
    expected_dimension: usize,
) -> Result<(), QuarryError> {
    if embeddings.len() != inputs {
        return Err(QuarryError::embedding_failed(format!(
            "embedder returned {} vectors for {} inputs",
            embeddings.len(),
            inputs
        )));
    }
    for embedding in embeddings {
        if embedding.len() != expected_dimension {
            return Err(QuarryError::EmbeddingDimensionMismatch {
                expected: expected_dimension,
                actual: embedding.len(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
