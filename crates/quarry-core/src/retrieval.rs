//! Adaptive multi-query retrieval.
//!
//! Layers three strategies over the query API for callers that issue
//! several query variants per information need:
//!
//! - [`AdaptiveRetrieval::multi_query`]: run each variant independently,
//!   deduplicate by chunk id (first occurrence wins), and re-rank so that
//!   chunks found by an earlier, higher-priority variant are preferred on
//!   score ties.
//! - [`AdaptiveRetrieval::adaptive_retrieve`]: hybrid pass first; when it
//!   comes back thin, a semantic-only pass merges in chunks the lexical
//!   signal missed.
//! - [`AdaptiveRetrieval::retrieve_with_context`]: expand each hit with
//!   neighboring chunks of the same document, tagged as context rather than
//!   primary hits, for continuity when chunks are consumed in sequence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::CorpusEngine;
use crate::errors::QuarryError;
use crate::search::SearchHit;
use crate::types::SearchMode;

/// Position of a context chunk relative to its primary hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPosition {
    /// Earlier ordinal in the same document.
    Before,
    /// Later ordinal in the same document.
    After,
}

/// A retrieved chunk with retrieval provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The scored hit.
    pub hit: SearchHit,

    /// 1-indexed rank of the query variant that first surfaced this chunk.
    pub query_rank: usize,

    /// The query variant that surfaced it.
    pub source_query: String,

    /// Set for context-expansion chunks; `None` for primary hits.
    pub context: Option<ContextPosition>,
}

impl RetrievedChunk {
    /// Whether this chunk was added by context expansion.
    pub fn is_context(&self) -> bool {
        self.context.is_some()
    }
}

/// Multi-query retrieval layer over a [`CorpusEngine`].
pub struct AdaptiveRetrieval<'a> {
    engine: &'a CorpusEngine,
}

impl<'a> AdaptiveRetrieval<'a> {
    /// Create a retrieval layer over an engine.
    pub fn new(engine: &'a CorpusEngine) -> Self {
        Self { engine }
    }

    /// Retrieve with multiple query variants and aggregate.
    ///
    /// Each variant is searched independently with `top_k`; results are
    /// deduplicated by chunk id (the earliest variant to surface a chunk
    /// keeps it) and re-sorted by `(score desc, query_rank asc)`. Up to
    /// `2 * top_k` results are returned so downstream consumers get
    /// headroom beyond a single query's budget. A failing variant is logged
    /// and skipped.
    pub fn multi_query(
        &self,
        queries: &[String],
        top_k: usize,
        mode: SearchMode,
    ) -> Vec<RetrievedChunk> {
        let mut results: Vec<RetrievedChunk> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (idx, query) in queries.iter().enumerate() {
            let query_rank = idx + 1;
            match self.engine.search(query, top_k, mode) {
                Ok(hits) => {
                    for hit in hits {
                        if seen.insert(hit.chunk.chunk_id.clone()) {
                            results.push(RetrievedChunk {
                                hit,
                                query_rank,
                                source_query: query.clone(),
                                context: None,
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!("Query {}/{} failed: {}", query_rank, queries.len(), e);
                }
            }
        }

        results.sort_by(|a, b| {
            b.hit
                .hybrid_score
                .partial_cmp(&a.hit.hybrid_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.query_rank.cmp(&b.query_rank))
        });
        results.truncate(top_k * 2);

        debug!(
            "Multi-query retrieval: {} unique results from {} queries",
            results.len(),
            queries.len()
        );
        results
    }

    /// Adaptive retrieval with a semantic fallback pass.
    ///
    /// Runs a hybrid [`Self::multi_query`] pass; when it yields fewer than
    /// `min_results`, a semantic-only pass merges in chunks the first pass
    /// missed. The merged list is truncated to `max_results`.
    pub fn adaptive_retrieve(
        &self,
        queries: &[String],
        min_results: usize,
        max_results: usize,
    ) -> Vec<RetrievedChunk> {
        let top_k = self.engine.config().default_top_k;
        let mut results = self.multi_query(queries, top_k, SearchMode::Hybrid);

        if results.len() < min_results {
            info!(
                "Hybrid pass yielded {} of {} wanted results; adding semantic-only pass",
                results.len(),
                min_results
            );
            let mut seen: HashSet<String> = results
                .iter()
                .map(|r| r.hit.chunk.chunk_id.clone())
                .collect();
            for extra in self.multi_query(queries, top_k, SearchMode::Semantic) {
                if seen.insert(extra.hit.chunk.chunk_id.clone()) {
                    results.push(extra);
                }
            }
        }

        results.truncate(max_results);
        debug!("Adaptive retrieval complete: {} results", results.len());
        results
    }

    /// Hybrid search expanded with neighboring chunks.
    ///
    /// For each primary hit, chunks of the same document within
    /// `window` ordinals are appended right after it, tagged with their
    /// position. A chunk already present (as a primary hit or an earlier
    /// neighbor) is never duplicated.
    pub fn retrieve_with_context(
        &self,
        query: &str,
        top_k: usize,
        window: u32,
    ) -> Result<Vec<RetrievedChunk>, QuarryError> {
        let primary = self.engine.search(query, top_k, SearchMode::Hybrid)?;

        let mut expanded: Vec<RetrievedChunk> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for hit in primary {
            let doc_id = hit.chunk.doc_id.clone();
            let ordinal = hit.chunk.ordinal;

            if seen.insert(hit.chunk.chunk_id.clone()) {
                expanded.push(RetrievedChunk {
                    hit,
                    query_rank: 1,
                    source_query: query.to_string(),
                    context: None,
                });
            }

            for neighbor in self.engine.neighbor_chunks(&doc_id, ordinal, window)? {
                if seen.insert(neighbor.chunk_id.clone()) {
                    let position = if neighbor.ordinal < ordinal {
                        ContextPosition::Before
                    } else {
                        ContextPosition::After
                    };
                    expanded.push(RetrievedChunk {
                        hit: SearchHit {
                            chunk: neighbor,
                            semantic_score: 0.0,
                            keyword_score: 0.0,
                            hybrid_score: 0.0,
                        },
                        query_rank: 1,
                        source_query: query.to_string(),
                        context: Some(position),
                    });
                }
            }
        }

        debug!(
            "Context expansion produced {} chunks for query `{}`",
            expanded.len(),
            query
        );
        Ok(expanded)
    }
}
