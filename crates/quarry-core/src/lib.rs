//! # quarry-core
//!
//! **Quarry** – a chunked, embedding-indexed, deduplicated corpus store
//! with a hybrid (dense + lexical) ranking engine.
//!
//! This crate provides the domain logic: semantic chunking, BM25-style
//! lexical scoring, hybrid score fusion, the ingestion pipeline with
//! skip/replace/fail semantics, and adaptive multi-query retrieval. The
//! storage layer (flat vector index, chunk metadata, document registry)
//! lives in `quarry-store`; the embedding model is an external collaborator
//! behind the [`EmbeddingBackend`] trait.
//!
//! ## Main Types
//!
//! - [`CorpusEngine`] – the main entry point: ingest, search, remove
//! - [`AdaptiveRetrieval`] – multi-query retrieval over an engine
//! - [`CorpusConfig`] – explicit configuration, injected at construction
//! - [`QuarryError`] – domain-specific error type
//!
//! ## Example
//!
//! ```ignore
//! use quarry_core::{CorpusConfig, CorpusEngine, SearchMode, SourceDocument};
//!
//! let engine = CorpusEngine::open("./corpus", CorpusConfig::default(), embedder)?;
//!
//! let doc = SourceDocument::new("guide", "guide.md", content, content_hash);
//! engine.ingest(&doc)?;
//!
//! for hit in engine.search("how are packets collected?", 5, SearchMode::Hybrid)? {
//!     println!("{:.3}  {}", hit.hybrid_score, hit.chunk.chunk_id);
//! }
//! ```

// Modules
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod ingest;
pub mod lexical;
pub mod ranker;
pub mod retrieval;
pub mod search;
pub mod types;

// Re-exports for convenience
pub use chunker::SemanticChunker;
pub use config::{ChunkerConfig, CorpusConfig, FusionWeights, LexicalConfig};
pub use embedding::{check_backend_dimension, check_embeddings, EmbeddingBackend};
pub use engine::CorpusEngine;
pub use errors::QuarryError;
pub use lexical::LexicalScorer;
pub use ranker::{fuse, normalize_lexical, FusedHit};
pub use retrieval::{AdaptiveRetrieval, ContextPosition, RetrievedChunk};
pub use search::SearchHit;
pub use types::{
    CorpusStats, DocumentSummary, IngestFailure, IngestReport, IngestStatus, SearchMode,
    SourceDocument,
};

// Storage layer re-exports for consumers that inspect persisted state
pub use quarry_store::{ChunkRecord, Corpus, DocumentEntry, StoreError};
