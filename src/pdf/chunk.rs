use super::Page;

/// A slice of the document text used as context for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub first_page: u32,
    pub last_page: u32,
}

impl Chunk {
    pub fn pages_label(&self) -> String {
        if self.first_page == self.last_page {
            format!("p. {}", self.first_page)
        } else {
            format!("pp. {}-{}", self.first_page, self.last_page)
        }
    }
}

/// Drops NUL bytes and collapses every whitespace run into one space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.replace('\0', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits the cleaned page text into chunks of at most `size` characters.
///
/// A chunk ends after the last ". " inside its window when there is one past the
/// first `overlap` characters, and the next chunk starts `overlap` characters
/// before that end. Every chunk reaches past the end of the one before it.
pub fn chunk(pages: &[Page], size: usize, overlap: usize) -> Vec<Chunk> {
    let size = size.max(1);

    let mut text: Vec<char> = Vec::new();
    // (offset of the page's first char, page number)
    let mut page_starts: Vec<(usize, u32)> = Vec::new();
    for page in pages {
        let cleaned = clean_text(&page.text);
        if cleaned.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        page_starts.push((text.len(), page.number));
        text.extend(cleaned.chars());
    }

    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + size).min(len);
        if end < len {
            // a boundary inside the overlap would be found again by the next window
            if let Some(boundary) = sentence_boundary(&text, start + overlap.max(1), end) {
                end = boundary;
            }
        }

        let window = &text[start..end];
        let leading = window.iter().take_while(|c| c.is_whitespace()).count();
        let trailing = window.iter().rev().take_while(|c| c.is_whitespace()).count();
        if leading < window.len() {
            let (first, last) = (start + leading, end - trailing - 1);
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[first..=last].iter().collect(),
                first_page: page_at(&page_starts, first),
                last_page: page_at(&page_starts, last),
            });
        }

        if end >= len {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    log::debug!("Split {} characters into {} chunks", len, chunks.len());
    chunks
}

/// End offset just past the last ". " whose full stop sits in `[from, end)`.
fn sentence_boundary(text: &[char], from: usize, end: usize) -> Option<usize> {
    (from..end.saturating_sub(1))
        .rev()
        .find(|&i| text[i] == '.' && text[i + 1] == ' ')
        .map(|i| i + 1)
}

fn page_at(page_starts: &[(usize, u32)], offset: usize) -> u32 {
    let after = page_starts.partition_point(|(start, _)| *start <= offset);
    page_starts
        .get(after.saturating_sub(1))
        .map(|(_, number)| *number)
        .unwrap_or(1)
}
