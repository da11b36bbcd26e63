//! Positional text chunker.
//!
//! Splits flattened document text into bounded, order-preserving slices.
//! Boundaries are purely positional (character offsets), never sentence- or
//! word-aware: metrics stay reproducible and independent of any linguistic
//! boundary detection. Concatenating the chunks in order reproduces the
//! input exactly.

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_CHARS: usize = 50_000;

/// Lazy iterator over positional chunks of `text`.
///
/// Every chunk holds at most `max_chars` characters; only the final chunk
/// may be shorter. Empty input yields no chunks. The iterator borrows the
/// input, so chunking is restartable by calling [`chunk_text`] again.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

/// Splits `text` into chunks of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize) -> Chunks<'_> {
    Chunks {
        rest: text,
        // A zero limit would never advance; clamp rather than loop forever.
        max_chars: max_chars.max(1),
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let split_at = self
            .rest
            .char_indices()
            .nth(self.max_chars)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(split_at);
        self.rest = rest;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert_eq!(chunk_text("", 10).count(), 0);
    }

    #[test]
    fn short_input_is_one_chunk() {
        let chunks: Vec<&str> = chunk_text("hello world", 100).collect();
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn concatenation_reproduces_input_exactly() {
        let text = "abcdefghij".repeat(37);
        for max in [1, 3, 7, 50, 369, 370, 371, 10_000] {
            let rejoined: String = chunk_text(&text, max).collect();
            assert_eq!(rejoined, text, "round-trip failed for max={}", max);
        }
    }

    #[test]
    fn every_chunk_respects_the_limit() {
        let text = "x".repeat(1000);
        for (i, chunk) in chunk_text(&text, 64).enumerate() {
            assert!(
                chunk.chars().count() <= 64,
                "chunk {} exceeds limit ({} chars)",
                i,
                chunk.chars().count()
            );
        }
    }

    #[test]
    fn only_final_chunk_may_be_short() {
        let text = "y".repeat(250);
        let chunks: Vec<&str> = chunk_text(&text, 100).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn splits_on_char_boundaries_not_bytes() {
        // Multi-byte characters must never be split mid-codepoint.
        let text = "§ü€".repeat(40);
        let rejoined: String = chunk_text(&text, 7).collect();
        assert_eq!(rejoined, text);
        for chunk in chunk_text(&text, 7) {
            assert!(chunk.chars().count() <= 7);
        }
    }

    #[test]
    fn restartable_iteration_is_identical() {
        let text = "the quick brown fox ".repeat(30);
        let a: Vec<&str> = chunk_text(&text, 17).collect();
        let b: Vec<&str> = chunk_text(&text, 17).collect();
        assert_eq!(a, b);
    }
}
