//! # quarry-store
//!
//! Persistence layer for the Quarry corpus: an append-only flat vector
//! index, the chunk metadata store keyed by vector row id, and the document
//! registry keyed by doc_id.
//!
//! The three artifacts are co-versioned and load/save together as a
//! [`Corpus`]; see the [`corpus`] module for the storage layout and the
//! startup consistency check.
//!
//! ## Main Types
//!
//! - [`Corpus`] – the three artifacts as one value
//! - [`FlatVectorIndex`] – exact, append-only embedding index
//! - [`ChunkStore`] / [`ChunkRecord`] – row-id-addressed chunk metadata
//! - [`DocumentRegistry`] / [`DocumentEntry`] – per-document bookkeeping
//! - [`StoreError`] – domain-specific error type

pub mod chunks;
pub mod corpus;
pub mod error;
pub mod registry;
pub mod vector;

pub use chunks::{ChunkRecord, ChunkStore, CHUNKS_FILENAME};
pub use corpus::{Corpus, CorpusMeta, META_FILENAME};
pub use error::{StoreError, StoreResult};
pub use registry::{DocumentEntry, DocumentRegistry, REGISTRY_FILENAME};
pub use vector::{FlatVectorIndex, VECTORS_FILENAME};
