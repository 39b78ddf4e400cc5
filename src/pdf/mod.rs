pub mod chunk;
pub mod search;

use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

pub use chunk::{chunk, Chunk};
pub use search::search;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("no text could be extracted from {0}")]
    NoText(PathBuf),
}

/// Text of one PDF page, numbered from 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Extracts the text of every page, in document order.
///
/// A page whose content stream can't be decoded is kept as an empty page so the
/// numbering stays aligned with the document. The whole extraction fails only
/// when the file can't be loaded or when no page has any text at all.
pub fn extract(path: &Path) -> Result<Vec<Page>, ExtractionError> {
    let doc = Document::load(path).map_err(|e| ExtractionError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for (page_num, _page_id) in doc.get_pages() {
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Skipping text of page {} in {:?}: {}", page_num, path, e);
                String::new()
            }
        };
        pages.push(Page::new(page_num, text));
    }

    if !has_text(&pages) {
        return Err(ExtractionError::NoText(path.to_path_buf()));
    }

    log::info!("Extracted {} pages from {:?}", pages.len(), path);
    Ok(pages)
}

pub fn has_text(pages: &[Page]) -> bool {
    pages.iter().any(|p| !p.text.trim().is_empty())
}

pub fn page_count(pages: &[Page]) -> usize {
    pages.len()
}

/// Text of the page with the given 1-based number, or `""` if there is none.
pub fn page_text(pages: &[Page], number: u32) -> &str {
    pages
        .iter()
        .find(|p| p.number == number)
        .map(|p| p.text.as_str())
        .unwrap_or("")
}
