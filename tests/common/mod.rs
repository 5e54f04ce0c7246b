//! Shared test fixtures: an in-memory artifact source with fetch accounting
//! and small per-language rule packs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use textlayer::backends::{FinderRules, NerRules, SentenceRules, TagRules, TokenRules};
use textlayer::{ArtifactError, ArtifactKey, ArtifactSource, Language, ModelKind, PipelineConfig};

/// In-memory artifact source. Counts fetches and tracks how many run
/// concurrently, so tests can observe the store's locking behavior.
#[derive(Default)]
pub struct MemorySource {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
    fetch_delay: Option<Duration>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source whose every fetch takes at least `delay`, to widen the window
    /// in which concurrent fetches can be observed.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &ArtifactKey, bytes: Vec<u8>) {
        self.artifacts
            .lock()
            .unwrap()
            .insert(key.storage_key(), bytes);
    }

    pub fn insert_pack<T: Serialize>(&self, key: &ArtifactKey, pack: &T) {
        self.insert(key, serde_json::to_vec(pack).unwrap());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were ever in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for MemorySource {
    async fn fetch(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self
            .artifacts
            .lock()
            .unwrap()
            .get(&key.storage_key())
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(key.storage_key()));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn artifact_key(kind: ModelKind, language: Language) -> ArtifactKey {
    ArtifactKey::new(kind, language, textlayer::models::ARTIFACT_VERSION)
}

pub fn test_config(model_dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        model_dir: model_dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

fn abbreviations() -> std::collections::HashSet<String> {
    ["Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "etc."]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn sentence_rules() -> SentenceRules {
    SentenceRules {
        abbreviations: abbreviations(),
    }
}

pub fn token_rules() -> TokenRules {
    TokenRules {
        abbreviations: abbreviations(),
    }
}

pub fn tag_rules() -> TagRules {
    let lexicon: HashMap<String, String> = [
        ("works", "VBZ"),
        ("lives", "VBZ"),
        ("at", "IN"),
        ("in", "IN"),
        ("he", "PRP"),
        ("she", "PRP"),
        ("the", "DT"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    TagRules {
        lexicon,
        ..TagRules::default()
    }
}

pub fn ner_rules() -> NerRules {
    NerRules {
        finders: vec![
            FinderRules {
                category: "person".to_string(),
                phrases: vec![
                    vec!["Dr.".to_string(), "Smith".to_string()],
                    vec!["Smith".to_string()],
                ],
            },
            FinderRules {
                category: "organization".to_string(),
                phrases: vec![vec!["ICIJ".to_string()]],
            },
            FinderRules {
                category: "location".to_string(),
                phrases: vec![vec!["Paris".to_string()]],
            },
        ],
    }
}

/// Install every rule pack the language's stage coverage calls for.
pub fn install_language(source: &MemorySource, language: Language) {
    source.insert_pack(
        &artifact_key(ModelKind::Sentence, language),
        &sentence_rules(),
    );
    source.insert_pack(&artifact_key(ModelKind::Token, language), &token_rules());
    source.insert_pack(&artifact_key(ModelKind::Pos, language), &tag_rules());
    if language != Language::German {
        source.insert_pack(&artifact_key(ModelKind::Ner, language), &ner_rules());
    }
}
