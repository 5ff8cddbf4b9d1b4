//! Named error kinds returned by every core operation.
//!
//! Each variant maps to a stable [`kind`](Error::kind) string so callers on
//! the far side of the tool boundary can branch on the failure without
//! parsing messages.

use thiserror::Error;

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// No condition record matches the requested category.
    #[error("no conditions found for category '{category}'")]
    NotFound { category: String },

    /// The backing data store could not be reached or failed mid-query.
    #[error("data store unavailable: {0}")]
    StoreUnavailable(String),

    /// The storage reference does not resolve to a readable file.
    #[error("document not found at '{reference}'")]
    FileNotFound { reference: String },

    /// The file exists but is not a PDF with an extractable text layer.
    #[error("unreadable document '{reference}': {reason}")]
    UnreadableDocument { reference: String, reason: String },

    #[error("search query must not be empty")]
    InvalidQuery,

    #[error("no conditions document loaded; load one by category first")]
    NoDocumentLoaded,

    /// A caller-supplied argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid chunking: overlap {overlap} must be smaller than chunk_size {chunk_size}")]
    InvalidChunking { chunk_size: usize, overlap: usize },
}

impl Error {
    /// Stable machine-readable identifier for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::StoreUnavailable(_) => "store_unavailable",
            Error::FileNotFound { .. } => "file_not_found",
            Error::UnreadableDocument { .. } => "unreadable_document",
            Error::InvalidQuery => "invalid_query",
            Error::NoDocumentLoaded => "no_document_loaded",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidChunking { .. } => "invalid_chunking",
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn store_unavailable(err: impl std::fmt::Display) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            Error::NotFound {
                category: "Car".into(),
            },
            Error::StoreUnavailable("down".into()),
            Error::FileNotFound {
                reference: "a.pdf".into(),
            },
            Error::UnreadableDocument {
                reference: "a.pdf".into(),
                reason: "bad xref".into(),
            },
            Error::InvalidQuery,
            Error::NoDocumentLoaded,
            Error::InvalidArgument("x".into()),
            Error::InvalidChunking {
                chunk_size: 4,
                overlap: 4,
            },
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn not_found_message_names_category() {
        let err = Error::NotFound {
            category: "Motorcycle".into(),
        };
        assert!(err.to_string().contains("Motorcycle"));
    }
}
