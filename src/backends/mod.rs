//! Annotator capabilities and the rule packs that implement them.
//!
//! Each stage consumes one opaque capability: segment text, tokenize a
//! sentence, tag a token sequence, find entities in a token sequence. The
//! built-in implementations are rule packs deserialized from model
//! artifacts; statistical backends can implement the same traits and be
//! swapped in without touching the pipeline.

mod rules;

pub use rules::{FinderRules, NerRules, SentenceRules, TagRules, TokenRules};

/// Splits text into an ordered, non-overlapping sequence of sentence
/// intervals over the input.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<(usize, usize)>;
}

/// Splits one sentence into token intervals relative to the sentence text.
pub trait WordTokenizer: Send + Sync {
    fn tokenize(&self, sentence: &str) -> Vec<(usize, usize)>;
}

/// Assigns one POS label per token.
///
/// Takes the whole sentence's tokens at once; tagging uses surrounding-token
/// context, so callers must not feed tokens one at a time.
pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[&str]) -> Vec<String>;
}

/// Finds entity mentions of a single category in a sentence's tokens.
///
/// Matches are token-index ranges `[i, j)` into the input slice, not
/// character offsets; the pipeline translates them back to document offsets.
pub trait EntityFinder: Send + Sync {
    /// Category identifier recorded as the span label ("person",
    /// "organization", "location", ...).
    fn category(&self) -> &str;

    fn find(&self, tokens: &[&str]) -> Vec<(usize, usize)>;
}
