//! Hybrid score fusion.
//!
//! Merges the dense (semantic) and lexical result sets for one query into a
//! single ranked list. The union of both sets is ranked, so a chunk that is
//! strong in *either* signal surfaces, with the missing score treated as
//! zero; a pure intersection would under-recall.
//!
//! Lexical scores are mapped into `[0, 1]` with a fixed-scale clamp rather
//! than corpus statistics, so the normalization is stable across queries.

use std::collections::HashMap;

use crate::config::FusionWeights;

/// Fixed scale used to clamp raw lexical scores into `[0, 1]`.
const LEXICAL_NORM_SCALE: f32 = 10.0;

/// A fused result for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    /// Vector row id of the chunk.
    pub row_id: usize,
    /// Batch-relative semantic similarity in `[0, 1]` (0 when absent from
    /// the semantic result set).
    pub semantic_score: f32,
    /// Normalized lexical score in `[0, 1]` (0 when absent from the lexical
    /// result set).
    pub lexical_score: f32,
    /// Weighted combination of the two.
    pub hybrid_score: f32,
}

/// Normalize a raw lexical score into `[0, 1]`.
pub fn normalize_lexical(raw: f32) -> f32 {
    (raw / LEXICAL_NORM_SCALE).min(1.0)
}

/// Fuse semantic and lexical result sets into one ranked list.
///
/// `semantic` carries batch-relative similarities in `[0, 1]`; `lexical`
/// carries raw keyword scores, normalized here. Results are sorted
/// descending by hybrid score, ties broken by ascending row id (chunk
/// insertion order) for determinism.
pub fn fuse(
    semantic: &[(usize, f32)],
    lexical: &[(usize, f32)],
    weights: &FusionWeights,
) -> Vec<FusedHit> {
    let semantic_scores: HashMap<usize, f32> = semantic.iter().copied().collect();
    let lexical_scores: HashMap<usize, f32> = lexical
        .iter()
        .map(|&(row_id, raw)| (row_id, normalize_lexical(raw)))
        .collect();

    let mut row_ids: Vec<usize> = semantic_scores
        .keys()
        .chain(lexical_scores.keys())
        .copied()
        .collect();
    row_ids.sort_unstable();
    row_ids.dedup();

    let mut fused: Vec<FusedHit> = row_ids
        .into_iter()
        .map(|row_id| {
            let semantic_score = semantic_scores.get(&row_id).copied().unwrap_or(0.0);
            let lexical_score = lexical_scores.get(&row_id).copied().unwrap_or(0.0);
            FusedHit {
                row_id,
                semantic_score,
                lexical_score,
                hybrid_score: weights.semantic * semantic_score
                    + weights.lexical * lexical_score,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.row_id.cmp(&b.row_id))
    });

    fused
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> FusionWeights {
        FusionWeights {
            semantic: 0.7,
            lexical: 0.3,
        }
    }

    #[test]
    fn test_normalize_lexical_clamps_at_one() {
        assert!((normalize_lexical(5.0) - 0.5).abs() < 1e-6);
        assert!((normalize_lexical(10.0) - 1.0).abs() < 1e-6);
        assert!((normalize_lexical(42.0) - 1.0).abs() < 1e-6);
        assert!(normalize_lexical(0.0).abs() < 1e-6);
    }

    #[test]
    fn test_fusion_weighting() {
        // Strong-semantic A beats strong-lexical B under 0.7/0.3 weights.
        let semantic = vec![(0, 0.9), (1, 0.1)];
        let lexical = vec![(1, 10.0)]; // normalizes to 1.0

        let fused = fuse(&semantic, &lexical, &weights());
        assert_eq!(fused.len(), 2);

        let a = fused.iter().find(|h| h.row_id == 0).unwrap();
        let b = fused.iter().find(|h| h.row_id == 1).unwrap();
        assert!((a.hybrid_score - 0.63).abs() < 1e-6);
        assert!((b.hybrid_score - 0.37).abs() < 1e-6);
        assert_eq!(fused[0].row_id, 0);
    }

    #[test]
    fn test_union_includes_single_signal_chunks() {
        let semantic = vec![(0, 0.8)];
        let lexical = vec![(7, 4.0)];

        let fused = fuse(&semantic, &lexical, &weights());
        assert_eq!(fused.len(), 2);

        let semantic_only = fused.iter().find(|h| h.row_id == 0).unwrap();
        assert!(semantic_only.lexical_score.abs() < 1e-6);

        let lexical_only = fused.iter().find(|h| h.row_id == 7).unwrap();
        assert!(lexical_only.semantic_score.abs() < 1e-6);
        assert!((lexical_only.lexical_score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_ties_broken_by_row_id() {
        let semantic = vec![(3, 0.5), (1, 0.5)];
        let lexical = vec![];

        let fused = fuse(&semantic, &lexical, &weights());
        assert_eq!(fused[0].row_id, 1);
        assert_eq!(fused[1].row_id, 3);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(fuse(&[], &[], &weights()).is_empty());

        // One empty side degrades to the other signal alone.
        let fused = fuse(&[], &[(2, 10.0)], &weights());
        assert_eq!(fused.len(), 1);
        assert!((fused[0].hybrid_score - 0.3).abs() < 1e-6);
    }
}
