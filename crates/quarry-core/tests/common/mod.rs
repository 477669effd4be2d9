//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use quarry_core::{
    CorpusConfig, CorpusEngine, EmbeddingBackend, QuarryError, SourceDocument,
};

/// Embedding dimension used across the test suite.
pub const DIMENSION: usize = 16;

/// Deterministic hash-based embedding backend.
///
/// Maps each input to a unit vector seeded by its hash, so identical text
/// always embeds identically and the semantic leg behaves deterministically
/// without a model.
pub struct HashEmbeddingBackend {
    dimension: usize,
}

impl HashEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_to_embedding(&self, content: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        let seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        let mut state = seed;

        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 33) as f32 / (u32::MAX as f32 / 2.0)) - 1.0;
            embedding.push(value);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        embedding
    }
}

impl EmbeddingBackend for HashEmbeddingBackend {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, QuarryError> {
        Ok(inputs.iter().map(|s| self.hash_to_embedding(s)).collect())
    }
}

/// Backend that can be switched into a failing state mid-test.
pub struct FlakyEmbeddingBackend {
    inner: HashEmbeddingBackend,
    fail: Arc<AtomicBool>,
}

impl FlakyEmbeddingBackend {
    /// Returns the backend and the switch that makes it start failing.
    pub fn new(dimension: usize) -> (Self, Arc<AtomicBool>) {
        let fail = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: HashEmbeddingBackend::new(dimension),
                fail: Arc::clone(&fail),
            },
            fail,
        )
    }
}

impl EmbeddingBackend for FlakyEmbeddingBackend {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, QuarryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QuarryError::embedding_failed("embedder offline"));
        }
        self.inner.embed_batch(inputs)
    }
}

/// Corpus configuration sized for short test documents.
pub fn test_config() -> CorpusConfig {
    let mut config = CorpusConfig::default();
    config.dimension = DIMENSION;
    config.chunker.chunk_size = 160;
    config.chunker.chunk_overlap = 30;
    config.chunker.min_chunk_size = 20;
    config
}

/// Open an engine over `dir` with the hash embedder.
pub fn open_engine(dir: &Path) -> CorpusEngine {
    CorpusEngine::open(dir, test_config(), Box::new(HashEmbeddingBackend::new(DIMENSION)))
        .expect("engine should open")
}

/// Build a source document with a derived name.
pub fn doc(doc_id: &str, content: &str, hash: &str) -> SourceDocument {
    SourceDocument::new(doc_id, format!("{}.txt", doc_id), content, hash)
}

/// Generate `n` paragraphs of filler prose about `topic`.
pub fn paragraphs(n: usize, topic: &str) -> String {
    (0..n)
        .map(|i| {
            format!(
                "Paragraph {} about {} with enough characters to clear the paragraph filter comfortably.",
                i, topic
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
