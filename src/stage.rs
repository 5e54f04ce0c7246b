//! Annotation stages, their dependency graph, and per-language coverage.
//!
//! Stages form a small DAG: Segment <- Tokenize <- {Tag, Recognize}.
//! A stage may only run once all of its dependencies have produced output
//! for the same input, so requested stage sets are expanded to their
//! dependency closure before execution.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// One annotation layer.
///
/// Declaration order is the pipeline's execution order; Tag and Recognize
/// are mutually independent but kept in a fixed order for determinism.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Segment,
    Tokenize,
    Tag,
    Recognize,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Segment, Stage::Tokenize, Stage::Tag, Stage::Recognize];

    /// Direct dependencies of this stage.
    pub fn dependencies(&self) -> &'static [Stage] {
        match self {
            Stage::Segment => &[],
            Stage::Tokenize => &[Stage::Segment],
            Stage::Tag => &[Stage::Tokenize],
            Stage::Recognize => &[Stage::Tokenize],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Segment => "sentence",
            Stage::Tokenize => "token",
            Stage::Tag => "pos",
            Stage::Recognize => "ner",
        }
    }
}

/// Expand a stage set with all transitive dependencies, returned in
/// execution order.
pub fn closure(requested: &[Stage]) -> Vec<Stage> {
    let mut wanted = [false; Stage::ALL.len()];
    let mut queue: Vec<Stage> = requested.to_vec();
    while let Some(stage) = queue.pop() {
        if !wanted[stage as usize] {
            wanted[stage as usize] = true;
            queue.extend_from_slice(stage.dependencies());
        }
    }
    Stage::ALL
        .iter()
        .copied()
        .filter(|s| wanted[*s as usize])
        .collect()
}

/// Stages covered by a language's models, or `None` for languages with no
/// models at all.
///
/// German ships no entity-finder pack, so Recognize is absent there.
pub fn supported_stages(language: Language) -> Option<&'static [Stage]> {
    match language {
        Language::English | Language::Spanish | Language::French => Some(&Stage::ALL),
        Language::German => Some(&[Stage::Segment, Stage::Tokenize, Stage::Tag]),
        _ => None,
    }
}

/// The stage set a run will actually execute: requested stages the language
/// supports, expanded to their dependency closure, in execution order.
///
/// Requesting an unsupported stage is not an error; the stage (and any
/// dependency pulled in only on its behalf) is silently dropped. Callers
/// discover actual coverage from the returned annotation.
pub fn effective_stages(language: Language, requested: &[Stage]) -> Vec<Stage> {
    let supported = supported_stages(language).unwrap_or(&[]);
    let kept: Vec<Stage> = requested
        .iter()
        .copied()
        .filter(|s| supported.contains(s))
        .collect();
    closure(&kept)
        .into_iter()
        .filter(|s| supported.contains(s))
        .collect()
}

/// Identifier of the POS label inventory in effect for a language's Tag
/// stage, so consumers can interpret tag strings correctly.
pub fn tag_label_set(language: Language) -> Option<&'static str> {
    match language {
        Language::English => Some("penn-treebank"),
        Language::Spanish => Some("ancora"),
        Language::French => Some("french-treebank"),
        Language::German => Some("stts"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_pulls_transitive_dependencies() {
        assert_eq!(
            closure(&[Stage::Recognize]),
            vec![Stage::Segment, Stage::Tokenize, Stage::Recognize]
        );
        assert_eq!(
            closure(&[Stage::Tag]),
            vec![Stage::Segment, Stage::Tokenize, Stage::Tag]
        );
    }

    #[test]
    fn test_closure_is_ordered_and_deduplicated() {
        let stages = closure(&[Stage::Recognize, Stage::Tag, Stage::Segment, Stage::Tag]);
        assert_eq!(
            stages,
            vec![Stage::Segment, Stage::Tokenize, Stage::Tag, Stage::Recognize]
        );
    }

    #[test]
    fn test_closure_of_empty_set_is_empty() {
        assert!(closure(&[]).is_empty());
    }

    #[test]
    fn test_german_has_no_recognize() {
        let supported = supported_stages(Language::German).unwrap();
        assert!(!supported.contains(&Stage::Recognize));
        assert!(supported.contains(&Stage::Tag));
    }

    #[test]
    fn test_effective_drops_unsupported_stage_and_orphan_dependencies() {
        // Recognize is unsupported for German; its dependencies were only
        // requested on its behalf, so nothing runs.
        assert!(effective_stages(Language::German, &[Stage::Recognize]).is_empty());
    }

    #[test]
    fn test_effective_keeps_supported_request() {
        assert_eq!(
            effective_stages(Language::German, &[Stage::Tag]),
            vec![Stage::Segment, Stage::Tokenize, Stage::Tag]
        );
    }

    #[test]
    fn test_effective_for_unknown_language_is_empty() {
        assert!(effective_stages(Language::Italian, &[Stage::Segment]).is_empty());
    }

    #[test]
    fn test_tag_label_set() {
        assert_eq!(tag_label_set(Language::English), Some("penn-treebank"));
        assert_eq!(tag_label_set(Language::German), Some("stts"));
        assert_eq!(tag_label_set(Language::Dutch), None);
    }
}
