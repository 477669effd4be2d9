//! Flat vector index.
//!
//! An append-only, exact-search vector index backed by a row-major `f32`
//! arena. Rows are addressed by dense ids `0..row_count`, which double as
//! the join key into the chunk metadata store.
//!
//! The index has no delete operation. Removing rows means rebuilding a new
//! index from the surviving embeddings and swapping it in wholesale; the
//! caller is responsible for performing that swap under an exclusive lock so
//! readers never observe a half-rebuilt index.
//!
//! Persistence uses a bincode snapshot with an explicit schema version and
//! row count in the header, so a loader can verify the index against the
//! chunk metadata before serving queries.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bincode::{config, Decode, Encode};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Filename for the serialized index.
pub const VECTORS_FILENAME: &str = "vectors.bin";

/// Current snapshot schema version.
const SCHEMA_VERSION: u32 = 1;

/// On-disk snapshot of the index.
#[derive(Debug, Encode, Decode)]
struct VectorSnapshot {
    version: u32,
    dimension: u32,
    row_count: u64,
    data: Vec<f32>,
}

/// Append-only flat vector index with exact linear-scan search.
#[derive(Debug, Clone)]
pub struct FlatVectorIndex {
    /// Dimension of every row.
    dimension: usize,

    /// Row-major embedding arena, `row_count * dimension` values.
    data: Vec<f32>,
}

impl FlatVectorIndex {
    /// Create a new empty index for the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Build an index from an ordered sequence of rows.
    ///
    /// Row ids are assigned densely in iteration order. This is the rebuild
    /// primitive: after any removal, survivors are re-embedded and fed back
    /// through here.
    pub fn from_rows<I>(dimension: usize, rows: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = Vec<f32>>,
    {
        let mut index = Self::new(dimension);
        for row in rows {
            index.push_row(&row)?;
        }
        Ok(index)
    }

    /// Dimension of the indexed vectors.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows in the index.
    pub fn row_count(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a batch of embeddings, assigning contiguous row ids starting
    /// at the current row count.
    ///
    /// Returns the assigned row ids. A dimension mismatch on any row is a
    /// configuration error and leaves the index unchanged.
    pub fn add(&mut self, embeddings: &[Vec<f32>]) -> StoreResult<Vec<usize>> {
        for embedding in embeddings {
            if embedding.len() != self.dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
        }

        let first = self.row_count();
        for embedding in embeddings {
            self.data.extend_from_slice(embedding);
        }

        Ok((first..first + embeddings.len()).collect())
    }

    /// Get a row by id.
    pub fn row(&self, row_id: usize) -> Option<&[f32]> {
        if row_id >= self.row_count() {
            return None;
        }
        let start = row_id * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Search for the `k` nearest rows by squared L2 distance.
    ///
    /// Results are ordered ascending by distance; ties are broken by
    /// ascending row id (insertion order) so rankings are deterministic.
    /// An empty index returns an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> StoreResult<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = (0..self.row_count())
            .map(|row_id| {
                let start = row_id * self.dimension;
                let row = &self.data[start..start + self.dimension];
                (row_id, squared_l2(query, row))
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Save the index to `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let file = fs::File::create(path)
            .map_err(|e| StoreError::snapshot_io(path, format!("failed to create index: {}", e)))?;
        let mut writer = BufWriter::new(file);

        let snapshot = VectorSnapshot {
            version: SCHEMA_VERSION,
            dimension: self.dimension as u32,
            row_count: self.row_count() as u64,
            data: self.data.clone(),
        };

        bincode::encode_into_std_write(&snapshot, &mut writer, config::standard()).map_err(
            |e| StoreError::snapshot_parse(path, format!("failed to serialize index: {}", e)),
        )?;

        debug!(
            "Saved vector index to {}: {} rows, dimension {}",
            path.display(),
            self.row_count(),
            self.dimension
        );
        Ok(())
    }

    /// Load an index from `path`.
    ///
    /// Fails fast on schema-version mismatch or on a header row count that
    /// disagrees with the payload length.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let file = fs::File::open(path)
            .map_err(|e| StoreError::snapshot_io(path, format!("failed to open index: {}", e)))?;
        let mut reader = BufReader::new(file);

        let snapshot: VectorSnapshot =
            bincode::decode_from_std_read(&mut reader, config::standard()).map_err(|e| {
                StoreError::snapshot_parse(path, format!("failed to deserialize index: {}", e))
            })?;

        if snapshot.version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersionMismatch {
                path: path.to_path_buf(),
                found: snapshot.version,
                expected: SCHEMA_VERSION,
            });
        }

        let dimension = snapshot.dimension as usize;
        let expected_len = snapshot.row_count as usize * dimension;
        if snapshot.data.len() != expected_len {
            return Err(StoreError::corrupt(format!(
                "index header declares {} rows of dimension {} but payload holds {} values",
                snapshot.row_count,
                dimension,
                snapshot.data.len()
            )));
        }

        debug!(
            "Loaded vector index from {}: {} rows, dimension {}",
            path.display(),
            snapshot.row_count,
            dimension
        );

        Ok(Self {
            dimension,
            data: snapshot.data,
        })
    }

    fn push_row(&mut self, row: &[f32]) -> StoreResult<()> {
        if row.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }
}

/// Compute squared Euclidean (L2) distance between two vectors.
///
/// Squared distance preserves ordering and avoids the sqrt; similarity
/// conversion happens in the query layer, batch-relative.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_squared_l2() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        assert!((squared_l2(&a, &b) - 25.0).abs() < 1e-6);
        assert!(squared_l2(&a, &a).abs() < 1e-6);
    }

    #[test]
    fn test_add_assigns_contiguous_row_ids() {
        let mut index = FlatVectorIndex::new(2);
        let ids = index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(ids, vec![0, 1]);

        let ids = index.add(&[vec![1.0, 1.0]]).unwrap();
        assert_eq!(ids, vec![2]);
        assert_eq!(index.row_count(), 3);
    }

    #[test]
    fn test_add_dimension_mismatch_leaves_index_unchanged() {
        let mut index = FlatVectorIndex::new(3);
        index.add(&[vec![1.0, 0.0, 0.0]]).unwrap();

        let err = index.add(&[vec![1.0, 0.0]]).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
        assert_eq!(index.row_count(), 1);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = FlatVectorIndex::new(2);
        index
            .add(&[vec![10.0, 0.0], vec![1.0, 0.0], vec![5.0, 0.0]])
            .unwrap();

        let results = index.search(&[0.0, 0.0], 3).unwrap();
        let ids: Vec<usize> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(results[0].1 < results[1].1);
    }

    #[test]
    fn test_search_ties_broken_by_row_id() {
        let mut index = FlatVectorIndex::new(2);
        // Two rows equidistant from the query.
        index
            .add(&[vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 5.0]])
            .unwrap();

        let results = index.search(&[0.0, 0.0], 2).unwrap();
        let ids: Vec<usize> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_search_empty_index_returns_empty() {
        let index = FlatVectorIndex::new(4);
        let results = index.search(&[0.0; 4], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let index = FlatVectorIndex::new(4);
        let err = index.search(&[0.0; 3], 5).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let mut index = FlatVectorIndex::new(1);
        index.add(&[vec![1.0], vec![2.0]]).unwrap();
        let results = index.search(&[0.0], 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_from_rows_assigns_dense_ids() {
        let index =
            FlatVectorIndex::from_rows(2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(index.row_count(), 2);
        assert_eq!(index.row(0), Some(&[1.0, 0.0][..]));
        assert_eq!(index.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(index.row(2), None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(VECTORS_FILENAME);

        let mut index = FlatVectorIndex::new(3);
        index
            .add(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .unwrap();
        index.save(&path).unwrap();

        let loaded = FlatVectorIndex::load(&path).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.row_count(), 2);
        assert_eq!(loaded.row(1), Some(&[4.0, 5.0, 6.0][..]));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(VECTORS_FILENAME);
        assert!(FlatVectorIndex::load(&path).is_err());
    }
}
