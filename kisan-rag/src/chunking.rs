//! Document chunking.
//!
//! [`BoundaryChunker`] splits text into overlapping windows of at most
//! `chunk_size` characters, pulling each window back to the last sentence
//! terminator or line break when that boundary lies past the window's
//! midpoint. Sizes are counted in `char`s, so multi-byte scheme names in
//! Kannada or Hindi never split inside a code point.

use std::ops::Range;

/// A strategy for splitting raw text into passages.
pub trait Chunker: Send + Sync {
    /// Split text into non-empty, trimmed passages.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only text.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into fixed-size, overlapping windows that prefer to end at
/// a sentence or line boundary.
///
/// # Example
///
/// ```rust
/// use kisan_rag::{BoundaryChunker, Chunker};
///
/// let chunker = BoundaryChunker::new(512, 100);
/// let chunks = chunker.chunk("PM-KISAN pays 6000 rupees a year. Apply online.");
/// assert_eq!(chunks.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// A zero `chunk_size` is raised to 1 and `chunk_overlap` is clamped
    /// below `chunk_size`, so every window advances the start offset.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Maximum characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared between consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for BoundaryChunker {
    fn default() -> Self {
        Self::new(512, 100)
    }
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        chunk_text(text, self.chunk_size, self.chunk_overlap)
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Split `text` into overlapping passages of at most `size` characters.
///
/// `overlap` is clamped below `size`. After each window the start offset
/// moves back `overlap` characters from the window's end, and chunking stops
/// once that offset is not inside the text.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    chunk_spans(text, size, overlap).into_iter().map(|span| text[span].to_string()).collect()
}

/// Byte ranges into `text` of the trimmed chunks [`chunk_text`] returns.
pub fn chunk_spans(text: &str, size: usize, overlap: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(b, _)| *b);

    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + size).min(len);

        if end < len {
            let window = &chars[start..end];
            if let Some(boundary) = window.iter().rposition(|(_, c)| is_boundary(*c)) {
                if boundary > size / 2 {
                    end = start + boundary + 1;
                }
            }
        }

        let (from, to) = (byte_at(start), byte_at(end));
        let piece = &text[from..to];
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let lead = piece.len() - piece.trim_start().len();
            spans.push(from + lead..from + lead + trimmed.len());
        }

        // A boundary cut can make the window shorter than the overlap.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunk_text("", 512, 100).is_empty());
        assert!(chunk_text("   \n\t ", 512, 100).is_empty());
    }

    #[test]
    fn short_text_is_a_single_trimmed_chunk() {
        let chunks = chunk_text("  PM Kisan scheme eligibility.  ", 512, 100);
        assert_eq!(chunks, vec!["PM Kisan scheme eligibility.".to_string()]);
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let text: String = ('a'..='z').cycle().take(30).collect();
        let chunks = chunk_text(&text, 10, 3);
        assert_eq!(chunks[0], &text[0..10]);
        assert_eq!(chunks[1], &text[7..17]);
        assert_eq!(chunks.last().map(|c| text.ends_with(c.as_str())), Some(true));
    }

    #[test]
    fn tail_window_inside_overlap_is_kept() {
        let text = "a".repeat(600);
        let lengths: Vec<usize> = chunk_text(&text, 512, 100).iter().map(String::len).collect();
        assert_eq!(lengths, vec![512, 188, 100]);
    }

    #[test]
    fn spans_point_at_chunks() {
        let text = "  Soil health card.\n  Kisan credit card covers crop loans.  ";
        let spans = chunk_spans(text, 24, 4);
        let chunks = chunk_text(text, 24, 4);
        assert_eq!(spans.len(), chunks.len());
        for (span, chunk) in spans.iter().zip(&chunks) {
            assert_eq!(&text[span.clone()], chunk);
        }
    }

    #[test]
    fn cuts_at_sentence_past_midpoint() {
        let text = "Farmers get support. More text follows here without stopping";
        let chunks = chunk_text(text, 30, 5);
        assert_eq!(chunks[0], "Farmers get support.");
    }

    #[test]
    fn ignores_boundary_before_midpoint() {
        let text = "Yes. abcdefghijklmnopqrstuvwxyzabcdefghij";
        let chunks = chunk_text(text, 20, 2);
        assert_eq!(chunks[0].chars().count(), 20);
    }

    #[test]
    fn overlap_not_smaller_than_size_still_terminates() {
        let text = "x".repeat(100);
        let chunks = chunk_text(&text, 10, 50);
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 100);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "ರೈತ ".repeat(200);
        let chunks = chunk_text(&text, 64, 10);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 64));
    }

    #[test]
    fn chunker_clamps_overlap() {
        let chunker = BoundaryChunker::new(10, 10);
        assert_eq!(chunker.chunk_overlap(), 9);
        let chunker = BoundaryChunker::new(0, 0);
        assert_eq!(chunker.chunk_size(), 1);
    }
}
