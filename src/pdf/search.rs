use super::Page;

/// Characters of context kept on each side of a match.
const CONTEXT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub page: u32,
    pub snippet: String,
}

/// Case-insensitive search for `keyword`, reporting the first match on every page.
pub fn search(pages: &[Page], keyword: &str) -> Vec<SearchHit> {
    let needle: Vec<char> = keyword.trim().chars().map(fold).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    pages
        .iter()
        .filter_map(|page| {
            let original: Vec<char> = page.text.chars().collect();
            let folded: Vec<char> = original.iter().copied().map(fold).collect();
            let at = folded
                .windows(needle.len())
                .position(|window| window == needle.as_slice())?;

            let from = at.saturating_sub(CONTEXT);
            let to = (at + needle.len() + CONTEXT).min(original.len());
            let snippet: String = original[from..to].iter().collect();
            Some(SearchHit {
                page: page.number,
                snippet: snippet.trim().to_string(),
            })
        })
        .collect()
}

// One char in, one char out, so offsets stay valid in the original text.
fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_keyword_regardless_of_case() {
        let pages = vec![
            Page::new(1, "Nothing to see."),
            Page::new(2, "The MITOCHONDRIA is the powerhouse."),
            Page::new(3, "mitochondria again, and Mitochondria twice"),
        ];

        let hits = search(&pages, "Mitochondria");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].page, 2);
        assert_eq!(hits[0].snippet, "The MITOCHONDRIA is the powerhouse.");
        assert_eq!(hits[1].page, 3);
    }

    #[test]
    fn snippet_is_a_window_around_the_match() {
        let text = format!("{}needle{}", "a".repeat(300), "b".repeat(300));
        let hits = search(&[Page::new(7, text)], "NEEDLE");

        assert_eq!(hits.len(), 1);
        let expected = format!("{}needle{}", "a".repeat(100), "b".repeat(100));
        assert_eq!(hits[0].snippet, expected);
    }

    #[test]
    fn empty_keyword_matches_nothing() {
        assert!(search(&[Page::new(1, "text")], "  ").is_empty());
    }

    #[test]
    fn non_ascii_text_keeps_offsets() {
        let hits = search(&[Page::new(1, "Ärger über Straße")], "ÜBER");
        assert_eq!(hits[0].snippet, "Ärger über Straße");
    }
}
