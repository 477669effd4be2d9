//! Lexical (BM25-style) keyword scoring.
//!
//! Scores chunks against a query with a term-frequency / length-normalized
//! formula:
//!
//! ```text
//! score(d) = Σ_{t∈Q} tf(t,d)·(k1+1) / (tf(t,d) + k1·(1 - b + b·|d|/avgdl))
//! ```
//!
//! with `k1 = 1.5`, `b = 0.75` by default. `avgdl` is the mean chunk length
//! in tokens across the searched corpus and is recomputed on every query so
//! scores stay honest as the corpus grows; nothing is cached between
//! queries. Chunks with no term overlap are excluded from results rather
//! than returned with a zero score.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use quarry_store::ChunkStore;

use crate::config::LexicalConfig;

/// Lexical scorer over the chunk corpus.
pub struct LexicalScorer {
    params: LexicalConfig,
    word: Regex,
}

impl LexicalScorer {
    /// Create a scorer with the given parameters.
    pub fn new(params: LexicalConfig) -> Self {
        Self {
            params,
            word: Regex::new(r"[A-Za-z0-9_]+").expect("static regex"),
        }
    }

    /// The scoring parameters in use.
    pub fn params(&self) -> &LexicalConfig {
        &self.params
    }

    /// Tokenize text into lowercase word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.word
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Score every chunk in the corpus against `query`.
    ///
    /// Returns `(row_id, score)` pairs sorted descending by score, ties
    /// broken by ascending row id (chunk insertion order), truncated to
    /// `top_k`. Chunks that share no term with the query are omitted.
    pub fn search(&self, query: &str, chunks: &ChunkStore, top_k: usize) -> Vec<(usize, f32)> {
        let query_terms = self.tokenize(query);
        if query_terms.is_empty() || chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }

        // Tokenize the corpus once per query; avgdl must reflect the corpus
        // as it is right now.
        let tokenized: Vec<Vec<String>> = chunks
            .iter()
            .map(|(_, record)| self.tokenize(&record.text))
            .collect();

        let total_tokens: usize = tokenized.iter().map(|t| t.len()).sum();
        if total_tokens == 0 {
            return Vec::new();
        }
        let avg_doc_len = total_tokens as f32 / tokenized.len() as f32;

        let mut scored: Vec<(usize, f32)> = tokenized
            .iter()
            .enumerate()
            .filter_map(|(row_id, tokens)| {
                let score = self.score_tokens(&query_terms, tokens, avg_doc_len);
                if score > 0.0 {
                    Some((row_id, score))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        debug!(
            "Lexical search matched {} of {} chunks",
            scored.len(),
            chunks.len()
        );
        scored
    }

    /// Score a single tokenized chunk against the query terms.
    fn score_tokens(&self, query_terms: &[String], tokens: &[String], avg_doc_len: f32) -> f32 {
        if tokens.is_empty() {
            return 0.0;
        }

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for token in tokens {
            *term_freq.entry(token.as_str()).or_insert(0) += 1;
        }

        let doc_len = tokens.len() as f32;
        let k1 = self.params.k1;
        let b = self.params.b;

        query_terms
            .iter()
            .map(|term| match term_freq.get(term.as_str()) {
                Some(&tf) if tf > 0 => {
                    let tf = tf as f32;
                    let numerator = tf * (k1 + 1.0);
                    let denominator = tf + k1 * (1.0 - b + b * doc_len / avg_doc_len);
                    numerator / denominator
                }
                _ => 0.0,
            })
            .sum()
    }
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::new(LexicalConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
