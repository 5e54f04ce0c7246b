//! Staged annotation pipeline - orchestrates model stores across stages.
//!
//! One `Pipeline` owns a model store per annotator kind and transforms raw
//! text into a layered [`Annotation`]. Many runs may execute concurrently on
//! the same pipeline; the stores are the only shared state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::annotation::{Annotation, Span};
use crate::backends::{
    EntityFinder, NerRules, PosTagger, SentenceRules, SentenceSplitter, TagRules, TokenRules,
    WordTokenizer,
};
use crate::config::PipelineConfig;
use crate::language::Language;
use crate::models::{ArtifactSource, HttpArtifactSource, ModelKind, ModelStore};
use crate::stage::{self, Stage};

/// Pipeline-kind identifier recorded on every annotation.
pub const PIPELINE_KIND: &str = "rules";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The requested language has no model coverage at all. Requests for
    /// covered languages never fail; stages just go missing from the output.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(Language),
}

/// The annotation pipeline runner.
pub struct Pipeline {
    sentence_models: ModelStore<SentenceRules>,
    token_models: ModelStore<TokenRules>,
    pos_models: ModelStore<TagRules>,
    ner_models: ModelStore<NerRules>,
}

impl Pipeline {
    /// Build a pipeline fetching artifacts over HTTP per `config`.
    pub fn new(config: PipelineConfig) -> Self {
        let source: Arc<dyn ArtifactSource> =
            Arc::new(HttpArtifactSource::new(config.model_url.clone()));
        Self::with_source(config, source)
    }

    /// Build a pipeline with an injected artifact source (tests, alternate
    /// transports).
    pub fn with_source(config: PipelineConfig, source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            sentence_models: ModelStore::new(
                ModelKind::Sentence,
                source.clone(),
                config.model_dir.clone(),
                config.model_version.clone(),
                config.retain,
            ),
            token_models: ModelStore::new(
                ModelKind::Token,
                source.clone(),
                config.model_dir.clone(),
                config.model_version.clone(),
                config.retain,
            ),
            pos_models: ModelStore::new(
                ModelKind::Pos,
                source.clone(),
                config.model_dir.clone(),
                config.model_version.clone(),
                config.retain,
            ),
            ner_models: ModelStore::new(
                ModelKind::Ner,
                source,
                config.model_dir,
                config.model_version,
                config.retain,
            ),
        }
    }

    /// Stages covered by a language's models, or `None` for languages with
    /// no models.
    pub fn supported_stages(&self, language: Language) -> Option<&'static [Stage]> {
        stage::supported_stages(language)
    }

    /// Identifier of the POS tagset in effect for a language.
    pub fn tag_label_set(&self, language: Language) -> Option<&'static str> {
        stage::tag_label_set(language)
    }

    /// Annotate `text`, producing spans for the requested stages (expanded
    /// to their dependency closure, restricted to what `language` supports).
    ///
    /// A stage whose model cannot be loaded is silently absent from the
    /// result, along with its dependents - partial annotation is preferred
    /// over total failure. Only a language with no coverage at all is
    /// rejected.
    pub async fn run(
        &self,
        text: &str,
        language: Language,
        requested: &[Stage],
    ) -> Result<Annotation, PipelineError> {
        if stage::supported_stages(language).is_none() {
            return Err(PipelineError::UnsupportedLanguage(language));
        }
        let effective = stage::effective_stages(language, requested);
        let stage_labels: Vec<&str> = effective.iter().map(Stage::label).collect();
        info!(
            language = language.code(),
            stages = ?stage_labels,
            "annotating"
        );

        let mut annotation = Annotation::new(text, PIPELINE_KIND, language);
        self.annotate(text, language, &effective, &mut annotation)
            .await;
        self.release_all(language).await;
        Ok(annotation)
    }

    async fn annotate(
        &self,
        text: &str,
        language: Language,
        effective: &[Stage],
        annotation: &mut Annotation,
    ) {
        if !effective.contains(&Stage::Segment) {
            return;
        }
        // Acquire in dependency order; a missing model drops the stage and
        // everything depending on it.
        let Some(sentencer) = self.sentence_models.acquire(language).await else {
            return;
        };
        let tokenizer = if effective.contains(&Stage::Tokenize) {
            self.token_models.acquire(language).await
        } else {
            None
        };
        let tagger = if effective.contains(&Stage::Tag) && tokenizer.is_some() {
            self.pos_models.acquire(language).await
        } else {
            None
        };
        let finders = if effective.contains(&Stage::Recognize) && tokenizer.is_some() {
            self.ner_models.acquire(language).await
        } else {
            None
        };

        for (sentence_start, sentence_end) in sentencer.split(text) {
            annotation.add(Stage::Segment, Span::new(sentence_start, sentence_end));

            let Some(tokenizer) = tokenizer.as_ref() else {
                continue;
            };
            let sentence = &text[sentence_start..sentence_end];
            let token_spans = tokenizer.tokenize(sentence);
            let token_texts: Vec<&str> = token_spans
                .iter()
                .map(|&(start, end)| &sentence[start..end])
                .collect();

            // The tagger consumes the whole sentence's token sequence at
            // once; labels pair positionally with the token spans.
            let tags = tagger.as_ref().map(|t| t.tag(&token_texts));

            for (index, &(token_start, token_end)) in token_spans.iter().enumerate() {
                let start = sentence_start + token_start;
                let end = sentence_start + token_end;
                annotation.add(Stage::Tokenize, Span::new(start, end));
                if let Some(tags) = &tags {
                    annotation.add(Stage::Tag, Span::labeled(start, end, tags[index].clone()));
                }
            }

            if let Some(ner) = finders.as_ref() {
                for finder in &ner.finders {
                    for (first, after_last) in finder.find(&token_texts) {
                        // Overlapping or duplicate matches from distinct
                        // finders are kept.
                        let Some((start, end)) =
                            entity_offsets(sentence_start, &token_spans, first, after_last)
                        else {
                            continue;
                        };
                        annotation.add(
                            Stage::Recognize,
                            Span::labeled(start, end, finder.category()),
                        );
                    }
                }
            }
        }
        debug!(
            language = language.code(),
            sentences = annotation.stage_count(Stage::Segment),
            tokens = annotation.stage_count(Stage::Tokenize),
            entities = annotation.stage_count(Stage::Recognize),
            "annotation complete"
        );
    }

    /// Release every store for `language`, honoring each store's retain
    /// policy. Safe for stores that never loaded anything.
    async fn release_all(&self, language: Language) {
        self.sentence_models.release(language).await;
        self.token_models.release(language).await;
        self.pos_models.release(language).await;
        self.ner_models.release(language).await;
    }
}

/// Translate an entity match, a token-index range `[first, after_last)`
/// over a sentence's tokens, to document offsets: the start of token
/// `first` and the end of token `after_last - 1`.
///
/// Returns `None` for empty or out-of-bounds ranges; `EntityFinder` is a
/// public trait, so a misbehaving backend must not panic the runner.
fn entity_offsets(
    sentence_start: usize,
    token_spans: &[(usize, usize)],
    first: usize,
    after_last: usize,
) -> Option<(usize, usize)> {
    if first >= after_last || after_last > token_spans.len() {
        return None;
    }
    Some((
        sentence_start + token_spans[first].0,
        sentence_start + token_spans[after_last - 1].1,
    ))
}
