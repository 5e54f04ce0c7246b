//! Rule-driven annotator packs deserialized from model artifacts.
//!
//! These carry the per-language knowledge (abbreviation lists, tag lexicons,
//! entity gazetteers) as plain data, keeping the annotation core independent
//! of any statistical toolkit.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{EntityFinder, PosTagger, SentenceSplitter, WordTokenizer};

/// Sentence-splitting rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentenceRules {
    /// Words whose trailing period does not close a sentence ("Dr.", "etc.").
    #[serde(default)]
    pub abbreviations: HashSet<String>,
}

impl SentenceRules {
    fn is_abbreviation(&self, text: &str, end: usize) -> bool {
        let head = &text[..end];
        let word_start = head
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        self.abbreviations.contains(&head[word_start..])
    }
}

impl SentenceSplitter for SentenceRules {
    fn split(&self, text: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;
        for (i, c) in text.char_indices() {
            let Some(sentence_start) = start else {
                if !c.is_whitespace() {
                    start = Some(i);
                }
                continue;
            };
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let end = i + c.len_utf8();
            // A terminator closes the sentence only at a real break: end of
            // input, or whitespace followed by an uppercase/numeric opener.
            let closes = match text[end..].chars().next() {
                None => true,
                Some(next) if next.is_whitespace() => text[end..]
                    .trim_start()
                    .chars()
                    .next()
                    .map_or(true, |opener| opener.is_uppercase() || opener.is_numeric()),
                Some(_) => false,
            };
            if closes && !(c == '.' && self.is_abbreviation(text, end)) {
                spans.push((sentence_start, end));
                start = None;
            }
        }
        // Trailing material without a terminator still forms a sentence.
        if let Some(sentence_start) = start {
            let end = text.trim_end().len();
            if end > sentence_start {
                spans.push((sentence_start, end));
            }
        }
        spans
    }
}

/// Tokenization rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRules {
    /// Words whose trailing period belongs to the token ("Dr.", "U.S.").
    #[serde(default)]
    pub abbreviations: HashSet<String>,
}

impl TokenRules {
    /// Split one whitespace-delimited word into tokens, peeling leading and
    /// trailing punctuation into tokens of their own.
    fn split_word(&self, text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
        if self.abbreviations.contains(&text[start..end]) {
            spans.push((start, end));
            return;
        }
        let mut core_start = start;
        while let Some(c) = text[core_start..end].chars().next() {
            if c.is_alphanumeric() {
                break;
            }
            spans.push((core_start, core_start + c.len_utf8()));
            core_start += c.len_utf8();
        }
        let mut core_end = end;
        let mut trailing = Vec::new();
        while core_start < core_end {
            let c = text[core_start..core_end]
                .chars()
                .next_back()
                .expect("non-empty word slice");
            if c.is_alphanumeric() || self.abbreviations.contains(&text[core_start..core_end]) {
                break;
            }
            trailing.push((core_end - c.len_utf8(), core_end));
            core_end -= c.len_utf8();
        }
        if core_start < core_end {
            spans.push((core_start, core_end));
        }
        spans.extend(trailing.into_iter().rev());
    }
}

impl WordTokenizer for TokenRules {
    fn tokenize(&self, sentence: &str) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut word_start: Option<usize> = None;
        for (i, c) in sentence.char_indices() {
            if c.is_whitespace() {
                if let Some(start) = word_start.take() {
                    self.split_word(sentence, start, i, &mut spans);
                }
            } else if word_start.is_none() {
                word_start = Some(i);
            }
        }
        if let Some(start) = word_start {
            self.split_word(sentence, start, sentence.len(), &mut spans);
        }
        spans
    }
}

static NUMBER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d[\d,.\-/]*$").expect("number shape pattern should compile")
});

/// POS-tagging rules: lexicon lookup with token-shape fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRules {
    /// Token (or lowercased token) to tag.
    #[serde(default)]
    pub lexicon: HashMap<String, String>,
    #[serde(default = "default_noun_tag")]
    pub noun_tag: String,
    #[serde(default = "default_proper_noun_tag")]
    pub proper_noun_tag: String,
    #[serde(default = "default_number_tag")]
    pub number_tag: String,
}

fn default_noun_tag() -> String {
    "NN".to_string()
}

fn default_proper_noun_tag() -> String {
    "NNP".to_string()
}

fn default_number_tag() -> String {
    "CD".to_string()
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            lexicon: HashMap::new(),
            noun_tag: default_noun_tag(),
            proper_noun_tag: default_proper_noun_tag(),
            number_tag: default_number_tag(),
        }
    }
}

impl TagRules {
    fn tag_one(&self, token: &str) -> String {
        if let Some(tag) = self
            .lexicon
            .get(token)
            .or_else(|| self.lexicon.get(&token.to_lowercase()))
        {
            return tag.clone();
        }
        if NUMBER_SHAPE.is_match(token) {
            return self.number_tag.clone();
        }
        if token.chars().all(|c| !c.is_alphanumeric()) {
            // Penn convention: punctuation tags as itself.
            return token.to_string();
        }
        if token.chars().next().is_some_and(char::is_uppercase) {
            return self.proper_noun_tag.clone();
        }
        self.noun_tag.clone()
    }
}

impl PosTagger for TagRules {
    fn tag(&self, tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| self.tag_one(t)).collect()
    }
}

/// One gazetteer entity finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderRules {
    /// Entity category this finder reports.
    pub category: String,
    /// Known mentions, each a sequence of exact tokens.
    #[serde(default)]
    pub phrases: Vec<Vec<String>>,
}

impl EntityFinder for FinderRules {
    fn category(&self) -> &str {
        &self.category
    }

    fn find(&self, tokens: &[&str]) -> Vec<(usize, usize)> {
        let mut matches = Vec::new();
        for i in 0..tokens.len() {
            for phrase in &self.phrases {
                if phrase.is_empty() || i + phrase.len() > tokens.len() {
                    continue;
                }
                if phrase.iter().zip(&tokens[i..]).all(|(p, t)| p == t) {
                    matches.push((i, i + phrase.len()));
                }
            }
        }
        matches
    }
}

/// The named-entity model for one language: a list of independent finders,
/// one per category. The pipeline runs all of them and keeps overlapping or
/// duplicate matches as separate annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NerRules {
    #[serde(default)]
    pub finders: Vec<FinderRules>,
}
