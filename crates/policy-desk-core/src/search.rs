//! Chunk search over a loaded document.
//!
//! Two modes are supported:
//!
//! - **Phrase**: case-insensitive substring containment. Matching chunks
//!   come back in document order, truncated to `max_results`.
//! - **Keywords**: the query is split into distinct whitespace-separated
//!   terms; each chunk scores the number of terms it contains, and matching
//!   chunks are ranked by score (ties keep document order).
//!
//! Case folding is ASCII-only, so byte offsets in the folded text line up
//! with the original and can be converted to character offsets directly.

use serde::Serialize;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::TextChunk;

/// How a query is matched against chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Phrase,
    Keywords,
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "phrase" => Ok(SearchMode::Phrase),
            "keywords" => Ok(SearchMode::Keywords),
            other => Err(Error::invalid_argument(format!(
                "unknown search mode '{}'; use phrase or keywords",
                other
            ))),
        }
    }
}

/// Where and how well a chunk matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    /// Character offset within the chunk of the first occurrence.
    pub offset: usize,
    /// Number of distinct query terms found (always 1 in phrase mode).
    pub score: usize,
    pub matched_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub chunk: TextChunk,
    #[serde(rename = "match")]
    pub matched: MatchInfo,
}

/// Run a search in the given mode.
pub fn search(
    chunks: &[TextChunk],
    query: &str,
    max_results: usize,
    mode: SearchMode,
) -> Result<Vec<SearchHit>> {
    match mode {
        SearchMode::Phrase => search_chunks(chunks, query, max_results),
        SearchMode::Keywords => search_keywords(chunks, query, max_results),
    }
}

/// Case-insensitive substring search, results in chunk order.
pub fn search_chunks(chunks: &[TextChunk], query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        return Err(Error::InvalidQuery);
    }
    let needle_folded = query.to_ascii_lowercase();

    let hits = chunks
        .iter()
        .filter_map(|chunk| {
            let offset = find_folded(&chunk.text, &needle_folded)?;
            Some(SearchHit {
                chunk: chunk.clone(),
                matched: MatchInfo {
                    offset,
                    score: 1,
                    matched_terms: vec![query.to_string()],
                },
            })
        })
        .take(max_results)
        .collect();

    Ok(hits)
}

/// Term-count scoring search, results ranked by score.
pub fn search_keywords(
    chunks: &[TextChunk],
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchHit>> {
    let folded = query.to_ascii_lowercase();
    let mut terms: Vec<&str> = Vec::new();
    for term in folded.split_whitespace() {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    if terms.is_empty() {
        return Err(Error::InvalidQuery);
    }

    let mut hits: Vec<SearchHit> = chunks
        .iter()
        .filter_map(|chunk| {
            let found: Vec<(&str, usize)> = terms
                .iter()
                .filter_map(|t| find_folded(&chunk.text, t).map(|off| (*t, off)))
                .collect();
            let offset = found.iter().map(|(_, off)| *off).min()?;
            Some(SearchHit {
                chunk: chunk.clone(),
                matched: MatchInfo {
                    offset,
                    score: found.len(),
                    matched_terms: found.iter().map(|(t, _)| t.to_string()).collect(),
                },
            })
        })
        .collect();

    // Stable sort keeps document order among equal scores.
    hits.sort_by(|a, b| b.matched.score.cmp(&a.matched.score));
    hits.truncate(max_results);
    Ok(hits)
}

/// Character offset of the first ASCII-case-insensitive occurrence of an
/// already-folded needle.
fn find_folded(haystack: &str, needle_folded: &str) -> Option<usize> {
    let byte_idx = haystack.to_ascii_lowercase().find(needle_folded)?;
    Some(haystack[..byte_idx].chars().count())
}
