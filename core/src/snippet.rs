use crate::tokenizer::{Tokenizer, WORD_RE};
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

const ELLIPSIS: &str = "...";

/// A bounded excerpt of a document with the byte ranges of matched words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub text: String,
    /// Sorted, non-overlapping byte ranges into `text`.
    pub highlights: Vec<Range<usize>>,
}

impl Snippet {
    /// Split `text` into `(piece, highlighted)` runs, in order.
    pub fn segments(&self) -> Vec<(&str, bool)> {
        let mut out = Vec::with_capacity(self.highlights.len() * 2 + 1);
        let mut pos = 0;
        for r in &self.highlights {
            if r.start > pos {
                out.push((&self.text[pos..r.start], false));
            }
            out.push((&self.text[r.clone()], true));
            pos = r.end;
        }
        if pos < self.text.len() {
            out.push((&self.text[pos..], false));
        }
        out
    }

    /// Wrap every highlight in `open`/`close`.
    pub fn marked(&self, open: &str, close: &str) -> String {
        let mut s = String::with_capacity(self.text.len() + self.highlights.len() * (open.len() + close.len()));
        for (piece, hit) in self.segments() {
            if hit {
                s.push_str(open);
                s.push_str(piece);
                s.push_str(close);
            } else {
                s.push_str(piece);
            }
        }
        s
    }
}

/// Excerpt of at most `max_chars` characters from `content`, opening `lead_chars` before the
/// first word whose index form is in `terms`. Without a match the excerpt is the start of the
/// content. A lead that does not fit inside the window is cut to half of it.
pub fn build_snippet(content: &str, terms: &HashSet<String>, tokenizer: &Tokenizer, max_chars: usize, lead_chars: usize) -> Snippet {
    let lead_chars = if lead_chars < max_chars { lead_chars } else { max_chars / 2 };
    let matches: Vec<Range<usize>> = WORD_RE
        .find_iter(content)
        .filter(|m| tokenizer.normalize_term(m.as_str()).map_or(false, |t| terms.contains(&t)))
        .map(|m| m.range())
        .collect();

    let start = match matches.first() {
        Some(first) => {
            let first_char = content[..first.start].chars().count();
            byte_offset(content, 0, first_char.saturating_sub(lead_chars))
        }
        None => 0,
    };
    let mut end = byte_offset(content, start, max_chars);
    if let Some(first) = matches.first() {
        end = end.max(first.end);
    }

    let window = &content[start..end];
    let start = start + (window.len() - window.trim_start().len());
    let end = end - (window.len() - window.trim_end().len());
    if start >= end {
        return Snippet::default();
    }

    let mut text = String::new();
    if start > 0 {
        text.push_str(ELLIPSIS);
    }
    let shift = text.len();
    text.push_str(&content[start..end]);
    if end < content.trim_end().len() {
        text.push_str(ELLIPSIS);
    }
    let highlights = matches
        .into_iter()
        .filter(|r| r.start >= start && r.end <= end)
        .map(|r| (r.start - start + shift)..(r.end - start + shift))
        .collect();
    Snippet { text, highlights }
}

/// Byte offset `chars` characters past `from`, clamped to the end of `s`.
fn byte_offset(s: &str, from: usize, chars: usize) -> usize {
    s[from..].char_indices().nth(chars).map(|(i, _)| from + i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> HashSet<String> { words.iter().map(|w| w.to_string()).collect() }

    #[test]
    fn short_content_is_returned_whole_with_highlights() {
        let s = build_snippet("Rust is great. rust systems.", &terms(&["rust"]), &Tokenizer::default(), 150, 50);
        assert_eq!(s.text, "Rust is great. rust systems.");
        assert_eq!(s.highlights, vec![0..4, 15..19]);
        assert_eq!(s.marked("<em>", "</em>"), "<em>Rust</em> is great. <em>rust</em> systems.");
    }

    #[test]
    fn long_content_is_windowed_around_first_match() {
        let content = format!("{} needle {}", "a ".repeat(100), "b ".repeat(100));
        let s = build_snippet(&content, &terms(&["needle"]), &Tokenizer::default(), 40, 10);
        assert!(s.text.starts_with(ELLIPSIS));
        assert!(s.text.ends_with(ELLIPSIS));
        assert!(s.text.chars().count() <= 40 + 2 * ELLIPSIS.len());
        assert_eq!(s.highlights.len(), 1);
        assert_eq!(&s.text[s.highlights[0].clone()], "needle");
    }

    #[test]
    fn oversized_lead_does_not_stretch_the_window() {
        let content = format!("{} needle {}", "a ".repeat(100), "b ".repeat(100));
        let s = build_snippet(&content, &terms(&["needle"]), &Tokenizer::default(), 20, 100);
        assert!(s.text.chars().count() <= 20 + 2 * ELLIPSIS.len());
        assert_eq!(&s.text[s.highlights[0].clone()], "needle");
    }

    #[test]
    fn no_match_takes_the_beginning() {
        let content = "x".repeat(300);
        let s = build_snippet(&content, &terms(&["missing"]), &Tokenizer::default(), 150, 50);
        assert_eq!(s.text, format!("{}...", "x".repeat(150)));
        assert!(s.highlights.is_empty());
    }

    #[test]
    fn multibyte_content_is_cut_on_char_boundaries() {
        let content = format!("{}café crème {}", "é".repeat(80), "ü".repeat(80));
        let s = build_snippet(&content, &terms(&["crème"]), &Tokenizer::default(), 30, 5);
        assert_eq!(&s.text[s.highlights[0].clone()], "crème");
    }

    #[test]
    fn words_match_only_as_whole_tokens() {
        let s = build_snippet("trees and trie", &terms(&["tree"]), &Tokenizer::default(), 150, 50);
        assert!(s.highlights.is_empty());
    }

    #[test]
    fn empty_content_gives_empty_snippet() {
        assert_eq!(build_snippet("", &terms(&["a"]), &Tokenizer::default(), 150, 50), Snippet::default());
    }
}
