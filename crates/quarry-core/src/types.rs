//! Common types shared across the Quarry engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SourceDocument
// ============================================================================

/// A loader-produced document ready for ingestion.
///
/// Quarry does not parse files itself; loaders hand over the extracted
/// content together with a content hash computed over it. The pipeline
/// trusts that hash (it never re-derives one), so loaders must hash
/// post-normalization content consistently across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document identifier, stable across re-ingestions.
    pub doc_id: String,

    /// Display name (typically the filename).
    pub name: String,

    /// Source path, if the document came from a file.
    #[serde(default)]
    pub path: Option<String>,

    /// Extracted text content.
    pub content: String,

    /// Hash of the content, as computed by the loader.
    pub content_hash: String,

    /// Page number, for paged formats.
    #[serde(default)]
    pub page_number: Option<u32>,

    /// Section label, when the loader tracks document structure.
    #[serde(default)]
    pub section: Option<String>,
}

impl SourceDocument {
    /// Create a document with the required fields.
    pub fn new(
        doc_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            name: name.into(),
            path: None,
            content: content.into(),
            content_hash: content_hash.into(),
            page_number: None,
            section: None,
        }
    }

    /// Set the source path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the page number.
    pub fn with_page_number(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Set the section label.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

// ============================================================================
// SearchMode
// ============================================================================

/// Retrieval mode for the query API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Dense vector search only.
    Semantic,

    /// Lexical (BM25) search only.
    Keyword,

    /// Weighted fusion of both signals (default).
    #[default]
    Hybrid,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Keyword => write!(f, "keyword"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "semantic" => Self::Semantic,
            "keyword" | "lexical" => Self::Keyword,
            _ => Self::Hybrid,
        })
    }
}

// ============================================================================
// Ingestion results
// ============================================================================

/// Outcome of ingesting a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// New document indexed.
    Added,

    /// Content hash unchanged; nothing was written.
    Skipped,

    /// Content changed; old chunks removed and the new set indexed.
    Replaced,

    /// Ingestion failed; no partial writes occurred. Appears in batch
    /// reports, while single-document ingestion surfaces the error itself.
    Failed,
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Skipped => write!(f, "skipped"),
            Self::Replaced => write!(f, "replaced"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A per-document failure recorded during batch ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    /// The document that failed.
    pub doc_id: String,
    /// Description of the failure.
    pub reason: String,
}

/// Aggregate counters for a batch ingestion run.
///
/// Batch ingestion never aborts on a per-document failure; it records the
/// failure here and moves on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents added or replaced.
    pub success: usize,
    /// Documents that failed to ingest.
    pub failed: usize,
    /// Documents skipped as unchanged.
    pub skipped: usize,
    /// Total documents processed.
    pub total: usize,
    /// Failure details, in processing order.
    pub errors: Vec<IngestFailure>,
}

impl IngestReport {
    /// Record the outcome of one document.
    pub fn record(&mut self, status: IngestStatus) {
        self.total += 1;
        match status {
            IngestStatus::Added | IngestStatus::Replaced => self.success += 1,
            IngestStatus::Skipped => self.skipped += 1,
            IngestStatus::Failed => self.failed += 1,
        }
    }

    /// Record a failure with its reason.
    pub fn record_failure(&mut self, doc_id: impl Into<String>, reason: impl Into<String>) {
        self.record(IngestStatus::Failed);
        self.errors.push(IngestFailure {
            doc_id: doc_id.into(),
            reason: reason.into(),
        });
    }
}

// ============================================================================
// Corpus statistics
// ============================================================================

/// Per-document summary included in [`CorpusStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document identifier.
    pub doc_id: String,
    /// Display name.
    pub name: String,
    /// Number of chunks indexed for this document.
    pub num_chunks: usize,
    /// Last successful (re-)ingestion time.
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of corpus-wide statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of registered documents.
    pub documents: usize,
    /// Number of indexed chunks.
    pub chunks: usize,
    /// Number of vector rows (always equals `chunks`).
    pub vectors: usize,
    /// Embedding dimension.
    pub dimension: usize,
    /// Per-document summaries, in document-id order.
    pub document_summaries: Vec<DocumentSummary>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_document_builder() {
        let doc = SourceDocument::new("d1", "d1.txt", "content", "hash")
            .with_path("/docs/d1.txt")
            .with_page_number(3)
            .with_section("intro");

        assert_eq!(doc.doc_id, "d1");
        assert_eq!(doc.path.as_deref(), Some("/docs/d1.txt"));
        assert_eq!(doc.page_number, Some(3));
        assert_eq!(doc.section.as_deref(), Some("intro"));
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!("semantic".parse::<SearchMode>().unwrap(), SearchMode::Semantic);
        assert_eq!("KEYWORD".parse::<SearchMode>().unwrap(), SearchMode::Keyword);
        assert_eq!("lexical".parse::<SearchMode>().unwrap(), SearchMode::Keyword);
        assert_eq!("hybrid".parse::<SearchMode>().unwrap(), SearchMode::Hybrid);
        assert_eq!("anything".parse::<SearchMode>().unwrap(), SearchMode::Hybrid);
    }

    #[test]
    fn test_ingest_report_counters() {
        let mut report = IngestReport::default();
        report.record(IngestStatus::Added);
        report.record(IngestStatus::Replaced);
        report.record(IngestStatus::Skipped);
        report.record_failure("bad", "no chunks");

        assert_eq!(report.total, 4);
        assert_eq!(report.success, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].doc_id, "bad");
    }
}
