//! Document registry.
//!
//! Tracks one entry per ingested document: content hash, ordered chunk-id
//! list, and timestamps. The content hash is what makes deduplication and
//! incremental re-ingestion work: identical hash means the stored version
//! is current and ingestion is a no-op.
//!
//! Persisted as JSON (human-inspectable, unlike the row-addressed binary
//! snapshots) with an explicit schema version.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Filename for the serialized registry.
pub const REGISTRY_FILENAME: &str = "registry.json";

/// Current registry schema version.
const SCHEMA_VERSION: u32 = 1;

/// Registry record for a single ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Document identifier.
    pub doc_id: String,

    /// Document display name (typically the filename).
    pub name: String,

    /// Source path, when the loader provides one.
    pub path: Option<String>,

    /// Hash of the ingested content, as supplied by the loader.
    pub content_hash: String,

    /// Ordered chunk ids produced from this document.
    pub chunk_ids: Vec<String>,

    /// First ingestion time.
    pub created_at: DateTime<Utc>,

    /// Last successful (re-)ingestion time.
    pub updated_at: DateTime<Utc>,
}

/// On-disk registry file.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    version: u32,
    documents: Vec<DocumentEntry>,
}

/// Registry of all ingested documents, keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    entries: BTreeMap<String, DocumentEntry>,
}

impl DocumentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a document is registered.
    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.contains_key(doc_id)
    }

    /// Get the entry for a document.
    pub fn get(&self, doc_id: &str) -> Option<&DocumentEntry> {
        self.entries.get(doc_id)
    }

    /// Whether the stored content hash for `doc_id` differs from `content_hash`.
    ///
    /// An unregistered document counts as changed.
    pub fn is_changed(&self, doc_id: &str, content_hash: &str) -> bool {
        match self.entries.get(doc_id) {
            Some(entry) => entry.content_hash != content_hash,
            None => true,
        }
    }

    /// Insert or replace an entry.
    pub fn upsert(&mut self, entry: DocumentEntry) {
        self.entries.insert(entry.doc_id.clone(), entry);
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&mut self, doc_id: &str) -> Option<DocumentEntry> {
        self.entries.remove(doc_id)
    }

    /// Iterate over entries in document-id order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.entries.values()
    }

    /// Total number of chunk ids across all entries.
    ///
    /// Must equal the chunk store length and the index row count; the
    /// corpus loader enforces this.
    pub fn total_chunks(&self) -> usize {
        self.entries.values().map(|e| e.chunk_ids.len()).sum()
    }

    /// Save the registry to `path`.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let file = RegistryFile {
            version: SCHEMA_VERSION,
            documents: self.entries.values().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(path, content).map_err(|e| {
            StoreError::snapshot_io(path, format!("failed to write registry: {}", e))
        })?;

        debug!("Saved registry with {} documents to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a registry from `path`, failing fast on schema mismatch.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::snapshot_io(path, format!("failed to read registry: {}", e))
        })?;

        let file: RegistryFile = serde_json::from_str(&content).map_err(|e| {
            StoreError::snapshot_parse(path, format!("failed to parse registry: {}", e))
        })?;

        if file.version != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersionMismatch {
                path: path.to_path_buf(),
                found: file.version,
                expected: SCHEMA_VERSION,
            });
        }

        let mut registry = Self::new();
        for entry in file.documents {
            registry.upsert(entry);
        }

        debug!(
            "Loaded registry with {} documents from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(doc_id: &str, hash: &str, chunks: usize) -> DocumentEntry {
        let now = Utc::now();
        DocumentEntry {
            doc_id: doc_id.to_string(),
            name: format!("{}.txt", doc_id),
            path: Some(format!("/docs/{}.txt", doc_id)),
            content_hash: hash.to_string(),
            chunk_ids: (0..chunks)
                .map(|i| format!("{}_chunk_{}", doc_id, i))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_upsert_and_lookup() {
        let mut registry = DocumentRegistry::new();
        registry.upsert(entry("a", "h1", 2));

        assert!(registry.contains("a"));
        assert!(!registry.contains("b"));
        assert_eq!(registry.get("a").unwrap().chunk_ids.len(), 2);
    }

    #[test]
    fn test_is_changed() {
        let mut registry = DocumentRegistry::new();
        registry.upsert(entry("a", "h1", 2));

        assert!(!registry.is_changed("a", "h1"));
        assert!(registry.is_changed("a", "h2"));
        assert!(registry.is_changed("missing", "h1"));
    }

    #[test]
    fn test_remove() {
        let mut registry = DocumentRegistry::new();
        registry.upsert(entry("a", "h1", 2));

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_total_chunks() {
        let mut registry = DocumentRegistry::new();
        registry.upsert(entry("a", "h1", 2));
        registry.upsert(entry("b", "h2", 3));
        assert_eq!(registry.total_chunks(), 5);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(REGISTRY_FILENAME);

        let mut registry = DocumentRegistry::new();
        registry.upsert(entry("a", "h1", 2));
        registry.upsert(entry("b", "h2", 1));
        registry.save(&path).unwrap();

        let loaded = DocumentRegistry::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("a"), registry.get("a"));
        assert_eq!(loaded.total_chunks(), 3);
    }
}
