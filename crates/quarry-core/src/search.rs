//! Query API.
//!
//! `search(query, k, mode)` runs dense, lexical, or hybrid retrieval over
//! the corpus and returns scored hits. Hybrid queries are fail-soft: if the
//! semantic leg throws (embedder down, dimension drift), the query degrades
//! to keyword-only ranking instead of failing, and vice-versa an empty
//! lexical set simply contributes nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quarry_store::ChunkRecord;

use crate::engine::CorpusEngine;
use crate::errors::QuarryError;
use crate::ranker::{fuse, normalize_lexical};
use crate::types::SearchMode;

/// Oversampling factor for the semantic leg of a semantic-only query.
const SEMANTIC_FETCH_FACTOR: usize = 2;

/// Oversampling factor for both legs of a hybrid query, so fusion sees
/// enough candidates from each signal.
const HYBRID_FETCH_FACTOR: usize = 3;

/// A scored search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: ChunkRecord,

    /// Batch-relative semantic similarity in `[0, 1]`; 0 in keyword mode or
    /// when the chunk was absent from the semantic result set.
    pub semantic_score: f32,

    /// Normalized lexical score in `[0, 1]`; 0 in semantic mode or when the
    /// chunk had no term overlap with the query.
    pub keyword_score: f32,

    /// The score this result list is ordered by.
    pub hybrid_score: f32,
}

impl CorpusEngine {
    /// Search the corpus.
    ///
    /// Returns up to `k` hits ordered by the mode's score. An empty corpus
    /// yields an empty list, not an error.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<Vec<SearchHit>, QuarryError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        {
            let state = self.read_state()?;
            if state.chunks.is_empty() {
                debug!("Search on empty corpus; returning no results");
                return Ok(Vec::new());
            }
        }

        match mode {
            SearchMode::Semantic => self.semantic_search(query, k),
            SearchMode::Keyword => self.keyword_search(query, k),
            SearchMode::Hybrid => self.hybrid_search(query, k),
        }
    }

    fn semantic_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QuarryError> {
        // Embed outside the read guard; model latency must not block writers.
        let embedding = self.embedder.embed(query)?;

        let state = self.read_state()?;
        let distances = state.index.search(&embedding, k * SEMANTIC_FETCH_FACTOR)?;
        let mut similarities = distances_to_similarities(&distances);
        similarities.truncate(k);

        let hits = similarities
            .into_iter()
            .filter_map(|(row_id, score)| {
                state.chunks.get(row_id).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    semantic_score: score,
                    keyword_score: 0.0,
                    hybrid_score: score,
                })
            })
            .collect::<Vec<_>>();

        debug!("Semantic search returned {} results", hits.len());
        Ok(hits)
    }

    fn keyword_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QuarryError> {
        let state = self.read_state()?;
        let hits = self
            .lexical
            .search(query, &state.chunks, k)
            .into_iter()
            .filter_map(|(row_id, raw)| {
                let normalized = normalize_lexical(raw);
                state.chunks.get(row_id).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    semantic_score: 0.0,
                    keyword_score: normalized,
                    hybrid_score: normalized,
                })
            })
            .collect::<Vec<_>>();

        debug!("Keyword search returned {} results", hits.len());
        Ok(hits)
    }

    fn hybrid_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, QuarryError> {
        let fetch = k * HYBRID_FETCH_FACTOR;

        // Fail-soft: a failing semantic leg degrades the query to the
        // surviving lexical signal rather than failing it.
        let embedding = match self.embedder.embed(query) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!("Semantic leg failed; degrading to keyword-only: {}", e);
                None
            }
        };

        let state = self.read_state()?;
        let semantic = match embedding {
            Some(embedding) => match state.index.search(&embedding, fetch) {
                Ok(distances) => distances_to_similarities(&distances),
                Err(e) => {
                    warn!("Semantic leg failed; degrading to keyword-only: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let lexical = self.lexical.search(query, &state.chunks, fetch);

        let mut fused = fuse(&semantic, &lexical, &self.config.fusion);
        fused.truncate(k);

        let hits = fused
            .into_iter()
            .filter_map(|hit| {
                state.chunks.get(hit.row_id).map(|chunk| SearchHit {
                    chunk: chunk.clone(),
                    semantic_score: hit.semantic_score,
                    keyword_score: hit.lexical_score,
                    hybrid_score: hit.hybrid_score,
                })
            })
            .collect::<Vec<_>>();

        debug!("Hybrid search returned {} results", hits.len());
        Ok(hits)
    }

    /// Chunks of the same document within `window` ordinals of `ordinal`.
    pub(crate) fn neighbor_chunks(
        &self,
        doc_id: &str,
        ordinal: u32,
        window: u32,
    ) -> Result<Vec<ChunkRecord>, QuarryError> {
        let state = self.read_state()?;
        Ok(state
            .chunks
            .neighbors(doc_id, ordinal, window)
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Convert L2 distances to similarities via `1 - d / (max_d + ε)`.
///
/// This is a *batch-local* normalization: the maximum distance of the
/// current result batch sets the scale, so scores are comparable within one
/// result list but NOT across independent queries. Kept deliberately: the
/// hybrid fusion weights are calibrated against it.
fn distances_to_similarities(distances: &[(usize, f32)]) -> Vec<(usize, f32)> {
    let max_distance = distances
        .iter()
        .map(|&(_, d)| d)
        .fold(0.0_f32, f32::max);

    distances
        .iter()
        .map(|&(row_id, d)| (row_id, 1.0 - d / (max_distance + 1e-6)))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
