//! Layered span annotation produced by one pipeline run.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::language::Language;
use crate::stage::Stage;

/// A half-open offset interval `[start, end)` over the original input,
/// with an optional label (POS tag or entity category).
///
/// Offsets are byte positions into the text passed to the run, including
/// for spans discovered on sentence-relative substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: Option<String>,
}

impl Span {
    /// Construct an unlabeled span. `end` is clamped up to `start` so the
    /// `start <= end` invariant holds in every build profile.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
            label: None,
        }
    }

    pub fn labeled(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            label: Some(label.into()),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether this span intersects the given offset range.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }
}

/// The complete set of spans across all computed stages for one input.
///
/// Keyed by (content hash, pipeline kind, language). Spans are stored per
/// stage in discovery order: sentence order, then intra-sentence order.
/// Construction and mutation are crate-private; the value is immutable once
/// a run returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    content_hash: String,
    pipeline: String,
    language: Language,
    layers: [Vec<Span>; 4],
}

impl Annotation {
    pub(crate) fn new(text: &str, pipeline: &str, language: Language) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self {
            content_hash: hex::encode(hasher.finalize()),
            pipeline: pipeline.to_string(),
            language,
            layers: Default::default(),
        }
    }

    pub(crate) fn add(&mut self, stage: Stage, span: Span) {
        self.layers[stage as usize].push(span);
    }

    /// SHA-256 hex digest of the annotated input.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Identifier of the pipeline kind that produced this annotation.
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Spans recorded for a stage, in document order.
    pub fn spans(&self, stage: Stage) -> &[Span] {
        &self.layers[stage as usize]
    }

    pub fn stage_count(&self, stage: Stage) -> usize {
        self.layers[stage as usize].len()
    }

    /// Stages that produced at least one span.
    pub fn stages_present(&self) -> Vec<Stage> {
        Stage::ALL
            .iter()
            .copied()
            .filter(|s| !self.layers[*s as usize].is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }

    /// Spans of a stage intersecting the given offset range, in document
    /// order. Used by consumers correlating tags to tokens.
    pub fn spans_overlapping(&self, stage: Stage, range: Range<usize>) -> Vec<&Span> {
        self.layers[stage as usize]
            .iter()
            .filter(|s| s.overlaps(&range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Annotation {
        let mut annotation = Annotation::new("one two three", "rules", Language::English);
        annotation.add(Stage::Segment, Span::new(0, 13));
        annotation.add(Stage::Tokenize, Span::new(0, 3));
        annotation.add(Stage::Tokenize, Span::new(4, 7));
        annotation.add(Stage::Tokenize, Span::new(8, 13));
        annotation.add(Stage::Tag, Span::labeled(0, 3, "CD"));
        annotation
    }

    #[test]
    fn test_spans_in_insertion_order() {
        let annotation = sample();
        let tokens = annotation.spans(Stage::Tokenize);
        assert_eq!(tokens.len(), 3);
        assert!(tokens.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_overlap_lookup() {
        let annotation = sample();
        let hits = annotation.spans_overlapping(Stage::Tokenize, 5..9);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].range(), 4..7);
        assert_eq!(hits[1].range(), 8..13);

        assert!(annotation.spans_overlapping(Stage::Tokenize, 3..4).is_empty());
    }

    #[test]
    fn test_stages_present() {
        let annotation = sample();
        assert_eq!(
            annotation.stages_present(),
            vec![Stage::Segment, Stage::Tokenize, Stage::Tag]
        );
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = Annotation::new("same text", "rules", Language::English);
        let b = Annotation::new("same text", "rules", Language::French);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn test_empty_annotation() {
        let annotation = Annotation::new("", "rules", Language::English);
        assert!(annotation.is_empty());
        for stage in Stage::ALL {
            assert_eq!(annotation.stage_count(stage), 0);
        }
    }

    #[test]
    fn test_inverted_span_is_clamped_empty() {
        let span = Span::new(5, 3);
        assert_eq!(span.range(), 5..5);
        assert!(span.range().is_empty());

        let labeled = Span::labeled(7, 2, "NN");
        assert_eq!(labeled.range(), 7..7);
        assert_eq!(labeled.label.as_deref(), Some("NN"));
    }

    #[test]
    fn test_span_containment() {
        let sentence = Span::new(0, 13);
        assert!(sentence.contains(&Span::new(4, 7)));
        assert!(sentence.contains(&Span::new(0, 13)));
        assert!(!sentence.contains(&Span::new(10, 14)));
    }
}
