//! Per-conversation holder for the currently loaded conditions document.
//!
//! The session is owned by whoever drives the conversation and passed to
//! the search and info operations explicitly. A new load replaces the
//! previous document wholesale; a failed load or search leaves it intact.

use crate::error::{Error, Result};
use crate::models::{ChunkingParams, DocumentInfo, LoadedDocument};
use crate::search::{search, SearchHit, SearchMode};

#[derive(Debug, Clone, Default)]
pub struct ConditionsSession {
    chunking: ChunkingParams,
    document: Option<LoadedDocument>,
}

impl ConditionsSession {
    pub fn new(chunking: ChunkingParams) -> Self {
        Self {
            chunking,
            document: None,
        }
    }

    /// Chunking parameters documents for this session should be built with.
    pub fn chunking(&self) -> ChunkingParams {
        self.chunking
    }

    /// Replace the loaded document.
    pub fn install(&mut self, document: LoadedDocument) -> &LoadedDocument {
        self.document.insert(document)
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn search(&self, query: &str, max_results: usize, mode: SearchMode) -> Result<Vec<SearchHit>> {
        let doc = self.document.as_ref().ok_or(Error::NoDocumentLoaded)?;
        search(&doc.chunks, query, max_results, mode)
    }

    pub fn info(&self) -> Result<DocumentInfo> {
        self.document
            .as_ref()
            .map(LoadedDocument::info)
            .ok_or(Error::NoDocumentLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::expected_chunk_count;

    fn doc(name: &str, pages: &[&str]) -> LoadedDocument {
        let pages: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
        LoadedDocument::from_pages(
            &format!("{}.pdf", name),
            name,
            &pages,
            ChunkingParams::new(40, 10).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn info_and_search_require_a_document() {
        let session = ConditionsSession::default();
        assert_eq!(session.info(), Err(Error::NoDocumentLoaded));
        assert_eq!(
            session.search("deductible", 3, SearchMode::Phrase),
            Err(Error::NoDocumentLoaded)
        );
    }

    #[test]
    fn info_chunk_count_follows_chunking_rule() {
        let mut session = ConditionsSession::new(ChunkingParams::new(40, 10).unwrap());
        session.install(doc(
            "CarSafe",
            &[
                "The deductible is 500 EUR for every claim filed.",
                "Coverage limit applies to theft and fire.",
            ],
        ));
        let info = session.info().unwrap();
        assert_eq!(info.page_count, 2);
        assert_eq!(
            info.chunk_count,
            expected_chunk_count(info.total_character_count, session.chunking())
        );
    }

    #[test]
    fn last_load_wins() {
        let mut session = ConditionsSession::default();
        session.install(doc("First", &["alpha"]));
        session.install(doc("Second", &["beta"]));
        assert_eq!(session.info().unwrap().name, "Second");
        assert!(session
            .search("alpha", 3, SearchMode::Phrase)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn failed_search_keeps_document() {
        let mut session = ConditionsSession::default();
        session.install(doc("Home", &["flood damage excluded"]));
        let before = session.info().unwrap();
        assert_eq!(
            session.search("", 3, SearchMode::Phrase),
            Err(Error::InvalidQuery)
        );
        assert_eq!(session.info().unwrap(), before);
        assert_eq!(
            session
                .search("FLOOD", 3, SearchMode::Phrase)
                .unwrap()
                .len(),
            1
        );
    }
}
