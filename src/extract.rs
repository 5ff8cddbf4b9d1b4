//! PDF loading: bytes on disk → per-page text → [`LoadedDocument`].
//!
//! Extraction is page by page so the page count survives into the loaded
//! document. A PDF that parses but yields no text at all (scanned images,
//! encrypted content) is reported as unreadable rather than loaded empty.

use std::path::Path;

use policy_desk_core::error::{Error, Result};
use policy_desk_core::models::{ChunkingParams, LoadedDocument};

/// Extract text from each page of an in-memory PDF.
pub fn extract_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let outcome = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("PDF parser aborted on malformed input".to_string()),
    }
}

/// Read the PDF at `path` and build a chunked [`LoadedDocument`].
///
/// `reference` is the storage reference as recorded in the conditions
/// store and is what errors and the document report back.
pub fn load_document(
    path: &Path,
    reference: &str,
    name: &str,
    params: ChunkingParams,
) -> Result<LoadedDocument> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            reference: reference.to_string(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to read conditions file");
        Error::FileNotFound {
            reference: reference.to_string(),
        }
    })?;

    let pages = extract_pages(&bytes).map_err(|reason| Error::UnreadableDocument {
        reference: reference.to_string(),
        reason,
    })?;

    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(Error::UnreadableDocument {
            reference: reference.to_string(),
            reason: "no extractable text layer".to_string(),
        });
    }

    let doc = LoadedDocument::from_pages(reference, name, &pages, params)?;
    tracing::info!(
        reference,
        pages = doc.page_count,
        chunks = doc.chunks.len(),
        "loaded conditions document"
    );
    Ok(doc)
}

/// Display name for a document loaded directly by reference.
pub fn default_name(reference: &str) -> String {
    Path::new(reference)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(reference)
        .to_string()
}

/// PDF builders for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, ObjectId, Stream};

    fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>) -> Vec<u8> {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// One page per entry, each drawing its text as a single Helvetica line.
    pub(crate) fn text_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![40.into(), 780.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        finish(doc, pages_id, kids)
    }

    /// One blank A4 page: valid PDF structure, no text.
    pub(crate) fn blank_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        finish(doc, pages_id, vec![page_id.into()])
    }
}
