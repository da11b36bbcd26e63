//! Surface linguistic metrics and content fingerprints.
//!
//! Per-chunk metrics are pure functions of the chunk text: word count,
//! sentence count, average sentence length, and lexical density (distinct
//! normalized word-forms over total words). The fingerprint is a SHA-256
//! hash of the exact chunk bytes, used for integrity and change detection,
//! never for metric computation.
//!
//! Lexical density is not linearly additive across chunks, so document
//! aggregation keeps the distinct word-form set alive for the whole
//! document via [`DocumentAccumulator`].

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Metrics computed over one chunk of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChunkMetrics {
    pub word_count: i64,
    pub sentence_count: i64,
    pub avg_sentence_length: f64,
    pub lexical_density: f64,
}

impl ChunkMetrics {
    /// Defined result for empty or whitespace-only text.
    pub const ZERO: ChunkMetrics = ChunkMetrics {
        word_count: 0,
        sentence_count: 0,
        avg_sentence_length: 0.0,
        lexical_density: 0.0,
    };
}

/// Computes metrics for one chunk.
///
/// Whitespace runs are collapsed before counting, so word count is
/// insensitive to whitespace variation. Empty text yields all zeros.
pub fn compute_metrics(text: &str) -> ChunkMetrics {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return ChunkMetrics::ZERO;
    }
    let word_count = words.len() as i64;

    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count() as i64;
    // Non-empty text with no terminator still counts as one utterance.
    let sentence_count = sentences.max(1);

    let distinct: HashSet<String> = words.iter().map(|w| normalize_word(w)).collect();

    ChunkMetrics {
        word_count,
        sentence_count,
        avg_sentence_length: word_count as f64 / sentence_count as f64,
        lexical_density: distinct.len() as f64 / word_count as f64,
    }
}

/// Normalizes a token for distinctness: lowercase, ASCII letters and digits only.
fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// SHA-256 fingerprint of the exact chunk bytes, lowercase hex.
pub fn checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whole-document metrics aggregated from per-chunk observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentMetrics {
    pub word_count: i64,
    pub sentence_count: i64,
    pub avg_sentence_length: f64,
    pub lexical_density: f64,
}

/// Accumulates chunk metrics into a whole-document aggregate.
///
/// Word and sentence counts sum; density requires the distinct word-form
/// set across all chunks, which this accumulator retains for the duration
/// of one document's processing.
#[derive(Debug, Default)]
pub struct DocumentAccumulator {
    total_words: i64,
    total_sentences: i64,
    distinct: HashSet<String>,
}

impl DocumentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one chunk's text and precomputed metrics.
    pub fn observe(&mut self, text: &str, metrics: &ChunkMetrics) {
        self.total_words += metrics.word_count;
        self.total_sentences += metrics.sentence_count;
        for word in text.split_whitespace() {
            self.distinct.insert(normalize_word(word));
        }
    }

    /// Finishes the document and returns its aggregate metrics.
    pub fn finish(self) -> DocumentMetrics {
        let avg_sentence_length = if self.total_sentences > 0 {
            self.total_words as f64 / self.total_sentences as f64
        } else {
            0.0
        };
        let lexical_density = if self.total_words > 0 {
            self.distinct.len() as f64 / self.total_words as f64
        } else {
            0.0
        };
        DocumentMetrics {
            word_count: self.total_words,
            sentence_count: self.total_sentences,
            avg_sentence_length,
            lexical_density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_all_zeros() {
        assert_eq!(compute_metrics(""), ChunkMetrics::ZERO);
        assert_eq!(compute_metrics("   \n\t  "), ChunkMetrics::ZERO);
    }

    #[test]
    fn spec_worked_example() {
        let m = compute_metrics("Rule one applies. Rule two also applies!");
        assert_eq!(m.word_count, 7);
        assert_eq!(m.sentence_count, 2);
        assert!((m.avg_sentence_length - 3.5).abs() < 1e-12);
        // distinct forms: rule, one, applies, two, also
        assert!((m.lexical_density - 5.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn whitespace_runs_do_not_change_word_count() {
        assert_eq!(
            compute_metrics("a  b").word_count,
            compute_metrics("a b").word_count
        );
        assert_eq!(compute_metrics("a \n\t b   c").word_count, 3);
    }

    #[test]
    fn text_without_terminator_counts_one_sentence() {
        let m = compute_metrics("no terminator here");
        assert_eq!(m.sentence_count, 1);
        assert_eq!(m.avg_sentence_length, 3.0);
    }

    #[test]
    fn terminator_runs_collapse() {
        let m = compute_metrics("First?! Second... Third.");
        assert_eq!(m.sentence_count, 3);
    }

    #[test]
    fn metrics_are_deterministic() {
        let text = "Repeatable input. With two sentences!";
        assert_eq!(compute_metrics(text), compute_metrics(text));
    }

    #[test]
    fn distinctness_ignores_case_and_punctuation() {
        let m = compute_metrics("Word word WORD word's");
        // All four tokens normalize to forms over {word, words}
        assert_eq!(m.word_count, 4);
        assert!((m.lexical_density - 2.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn checksum_is_sensitive_to_single_char_changes() {
        let a = checksum("regulatory text");
        let b = checksum("regulatory texx");
        assert_ne!(a, b);
        assert_eq!(a, checksum("regulatory text"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn accumulator_sums_counts_and_merges_word_forms() {
        let c1 = "alpha beta gamma.";
        let c2 = "beta gamma delta!";
        let m1 = compute_metrics(c1);
        let m2 = compute_metrics(c2);

        let mut acc = DocumentAccumulator::new();
        acc.observe(c1, &m1);
        acc.observe(c2, &m2);
        let doc = acc.finish();

        assert_eq!(doc.word_count, 6);
        assert_eq!(doc.sentence_count, 2);
        assert_eq!(doc.avg_sentence_length, 3.0);
        // distinct across both chunks: alpha beta gamma delta
        assert!((doc.lexical_density - 4.0 / 6.0).abs() < 1e-12);
        // Density is not the mean of chunk densities (both chunks are 1.0).
        assert!(doc.lexical_density < 1.0);
    }

    #[test]
    fn accumulator_with_no_chunks_is_zero() {
        let doc = DocumentAccumulator::new().finish();
        assert_eq!(doc.word_count, 0);
        assert_eq!(doc.sentence_count, 0);
        assert_eq!(doc.avg_sentence_length, 0.0);
        assert_eq!(doc.lexical_density, 0.0);
    }
}
