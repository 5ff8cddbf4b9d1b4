//! Core data models used throughout Policy Desk.
//!
//! Condition records and policy records come from the data stores; loaded
//! documents and their chunks live only in a conversation session.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::chunk::chunk_text;
use crate::error::{Error, Result};

/// Reference data pointing a policy category at its conditions PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConditionRecord {
    pub category: String,
    /// Conditions edition, e.g. `CarSafe26.1`.
    pub name: String,
    /// Path (absolute, or relative to the conditions root) of the PDF.
    pub storage_reference: String,
}

/// A fixed-size slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// Position in the chunk sequence, starting at 0.
    pub index: usize,
    pub text: String,
    /// Character offset of the chunk's first character in the raw text.
    pub start_offset: usize,
}

/// Sliding-window parameters for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkingParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkingParams {
    /// Validate `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Distance between consecutive window starts.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// A conditions document held in memory for searching.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source_reference: String,
    /// Display name (the conditions edition, or the file name).
    pub name: String,
    pub raw_text: String,
    pub page_count: usize,
    pub chunks: Vec<TextChunk>,
}

impl LoadedDocument {
    /// Assemble a document from per-page text.
    ///
    /// Each page is prefixed with `[Page N] ` and pages are joined with a
    /// newline so boundaries stay visible in search results.
    pub fn from_pages(
        source_reference: &str,
        name: &str,
        pages: &[String],
        params: ChunkingParams,
    ) -> Result<Self> {
        let raw_text = pages
            .iter()
            .enumerate()
            .map(|(i, text)| format!("[Page {}] {}", i + 1, text.trim_end()))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunk_text(&raw_text, params.chunk_size, params.overlap)?;

        Ok(Self {
            source_reference: source_reference.to_string(),
            name: name.to_string(),
            raw_text,
            page_count: pages.len(),
            chunks,
        })
    }

    pub fn character_count(&self) -> usize {
        self.raw_text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            name: self.name.clone(),
            source_reference: self.source_reference.clone(),
            page_count: self.page_count,
            chunk_count: self.chunks.len(),
            total_character_count: self.character_count(),
            word_count: self.word_count(),
        }
    }
}

/// Summary of the loaded document, as reported by `get_pdf_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub source_reference: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub total_character_count: usize,
    pub word_count: usize,
}

/// A stored insurance policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurancePolicyRecord {
    pub id: String,
    pub policy_holder: String,
    pub policy_type: String,
    pub provider: String,
    pub guarantees: String,
    pub expiration_date: NaiveDate,
    /// Conditions edition matched from `policy_type` when the policy was added.
    pub conditions_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller input for adding a policy. The date is still raw text here.
#[derive(Debug, Clone, Default)]
pub struct NewPolicy {
    pub policy_holder: String,
    pub policy_type: String,
    pub provider: String,
    pub guarantees: String,
    /// `YYYY-MM-DD`.
    pub expiration_date: String,
}

/// Record counts reported by `get_db_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub policy_count: i64,
    pub condition_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_params_reject_overlap_at_or_above_size() {
        assert!(ChunkingParams::new(4, 3).is_ok());
        assert_eq!(
            ChunkingParams::new(4, 4),
            Err(Error::InvalidChunking {
                chunk_size: 4,
                overlap: 4
            })
        );
        assert!(ChunkingParams::new(0, 0).is_err());
    }

    #[test]
    fn from_pages_marks_page_boundaries() {
        let pages = vec!["first page".to_string(), "second page\n".to_string()];
        let doc =
            LoadedDocument::from_pages("c/car.pdf", "CarSafe26.1", &pages, ChunkingParams::default())
                .unwrap();
        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.raw_text, "[Page 1] first page\n[Page 2] second page");
        assert_eq!(doc.chunks.len(), 1);
    }

    #[test]
    fn info_reports_counts() {
        let pages = vec!["alpha beta".to_string()];
        let doc = LoadedDocument::from_pages("x.pdf", "X", &pages, ChunkingParams::new(5, 1).unwrap())
            .unwrap();
        let info = doc.info();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.total_character_count, "[Page 1] alpha beta".len());
        assert_eq!(info.word_count, 4);
        assert_eq!(info.chunk_count, doc.chunks.len());
    }
}
