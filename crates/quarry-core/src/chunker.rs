//! Semantic text chunking.
//!
//! Splits raw document text into overlapping, size-bounded chunks that
//! respect document structure: whitespace is normalized, text is split into
//! paragraphs on blank-line and page-marker boundaries, and paragraphs are
//! greedily accumulated into chunks of at most `chunk_size` characters.
//! Each new chunk is seeded with an overlap suffix of its predecessor,
//! trimmed to the nearest sentence boundary when one exists, so retrieval
//! context survives chunk boundaries.
//!
//! Chunking is a pure function of its input and never fails: empty or
//! too-short input yields an empty sequence, and a trailing buffer below
//! `min_chunk_size` is silently dropped.

use regex::Regex;
use tracing::debug;

use quarry_store::ChunkRecord;

use crate::config::ChunkerConfig;
use crate::types::SourceDocument;

/// Paragraphs shorter than this after trimming are treated as noise
/// (stray line fragments, page headers) and discarded.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Structure-aware chunker.
pub struct SemanticChunker {
    config: ChunkerConfig,
    multi_newline: Regex,
    intra_whitespace: Regex,
    paragraph_break: Regex,
    sentence_boundary: Regex,
}

impl SemanticChunker {
    /// Create a chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            multi_newline: Regex::new(r"\n{3,}").expect("static regex"),
            intra_whitespace: Regex::new(r"[ \t]+").expect("static regex"),
            paragraph_break: Regex::new(r"\n\s*\n|--- Page \d+ ---|\n+").expect("static regex"),
            sentence_boundary: Regex::new(r"[.!?]\s+").expect("static regex"),
        }
    }

    /// The configuration this chunker was built with.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split a document into ordered chunks.
    ///
    /// Returns an empty vector for empty or too-short input (logged, not an
    /// error).
    pub fn split(&self, doc: &SourceDocument) -> Vec<ChunkRecord> {
        let trimmed = doc.content.trim();
        if char_len(trimmed) < self.config.min_chunk_size {
            debug!(
                "Document `{}` too short to chunk ({} chars)",
                doc.doc_id,
                char_len(trimmed)
            );
            return Vec::new();
        }

        let text = self.normalize(&doc.content);
        let paragraphs = self.paragraphs(&text);

        let mut chunks: Vec<ChunkRecord> = Vec::new();
        let mut current = String::new();
        let mut current_start: u64 = 0;

        for para in paragraphs {
            if char_len(&current) + char_len(&para) > self.config.chunk_size {
                if char_len(current.trim()) >= self.config.min_chunk_size {
                    chunks.push(self.record(doc, chunks.len() as u32, &current, current_start));

                    let overlap = self.overlap_text(&current);
                    current_start += (char_len(&current) - char_len(&overlap)) as u64;
                    current = overlap;
                    if !current.is_empty() {
                        current.push_str("\n\n");
                    }
                    current.push_str(&para);
                } else {
                    // Buffer still below the minimum: keep accumulating even
                    // past the target size rather than emit a stub chunk.
                    current.push_str(&para);
                }
            } else {
                current.push_str(&para);
            }
        }

        if char_len(current.trim()) >= self.config.min_chunk_size {
            chunks.push(self.record(doc, chunks.len() as u32, &current, current_start));
        } else if !current.trim().is_empty() {
            debug!(
                "Dropping trailing buffer of {} chars for `{}` (below minimum {})",
                char_len(current.trim()),
                doc.doc_id,
                self.config.min_chunk_size
            );
        }

        debug!("Split `{}` into {} chunks", doc.doc_id, chunks.len());
        chunks
    }

    /// Normalize whitespace while preserving paragraph breaks.
    fn normalize(&self, text: &str) -> String {
        let text = text.replace(['\u{000C}', '\u{000B}'], "");
        let text = self.multi_newline.replace_all(&text, "\n\n");
        let text = self.intra_whitespace.replace_all(&text, " ");
        text.trim().to_string()
    }

    /// Split normalized text into paragraph units.
    ///
    /// Paragraphs longer than `chunk_size` are hard-split at sentence, word,
    /// and finally character granularity so no single unit can exceed the
    /// target size.
    fn paragraphs(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for raw in self.paragraph_break.split(text) {
            let para = raw.trim();
            if char_len(para) <= MIN_PARAGRAPH_CHARS {
                continue;
            }
            if char_len(para) > self.config.chunk_size {
                for piece in self.hard_split(para) {
                    out.push(format!("{}\n\n", piece));
                }
            } else {
                out.push(format!("{}\n\n", para));
            }
        }
        out
    }

    /// Break an oversized paragraph into pieces of at most `chunk_size`
    /// characters, preferring word boundaries and falling back to raw
    /// character slices for pathological unbroken runs.
    fn hard_split(&self, para: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let mut pieces = Vec::new();
        let mut buf = String::new();

        for word in para.split_inclusive(' ') {
            if !buf.is_empty() && char_len(&buf) + char_len(word) > size {
                pieces.push(buf.trim_end().to_string());
                buf.clear();
            }

            if char_len(word) > size {
                let chars: Vec<char> = word.chars().collect();
                for slice in chars.chunks(size) {
                    if slice.len() == size {
                        pieces.push(slice.iter().collect());
                    } else {
                        buf = slice.iter().collect();
                    }
                }
            } else {
                buf.push_str(word);
            }
        }

        if !buf.trim().is_empty() {
            pieces.push(buf.trim_end().to_string());
        }
        pieces
    }

    /// Extract the overlap suffix carried into the next chunk.
    ///
    /// Takes the last `chunk_overlap` characters and trims to the last
    /// sentence boundary inside that window when one exists.
    fn overlap_text(&self, text: &str) -> String {
        let trimmed = text.trim_end();
        if char_len(trimmed) <= self.config.chunk_overlap {
            return trimmed.to_string();
        }

        let region = tail_chars(trimmed, self.config.chunk_overlap);
        if let Some(boundary) = self.sentence_boundary.find_iter(region).last() {
            let suffix = region[boundary.end()..].trim();
            if !suffix.is_empty() {
                return suffix.to_string();
            }
        }
        region.to_string()
    }

    fn record(
        &self,
        doc: &SourceDocument,
        ordinal: u32,
        buffer: &str,
        start: u64,
    ) -> ChunkRecord {
        ChunkRecord {
            chunk_id: format!("{}_chunk_{}", doc.doc_id, ordinal),
            doc_id: doc.doc_id.clone(),
            doc_name: doc.name.clone(),
            ordinal,
            text: buffer.trim().to_string(),
            start_offset: start,
            end_offset: start + char_len(buffer) as u64,
            page_number: doc.page_number,
            section: doc.section.clone(),
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s` (the whole string if shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(len - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

// ============================================================================
// Tests
// ============================================================================
