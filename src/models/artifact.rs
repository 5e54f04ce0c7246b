//! Remote artifact source for serialized model rule packs.

use async_trait::async_trait;
use thiserror::Error;

use crate::language::Language;

/// Current artifact layout version.
pub const ARTIFACT_VERSION: &str = "1-0";

/// Errors from the remote artifact collaborator.
///
/// The model store treats both variants uniformly as "model unavailable";
/// the distinction exists for logging and for callers probing coverage.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("Transfer failed: {0}")]
    Transfer(String),
}

/// Which annotator a model artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Sentence,
    Token,
    Pos,
    Ner,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Sentence => "sentence",
            ModelKind::Token => "token",
            ModelKind::Pos => "pos",
            ModelKind::Ner => "ner",
        }
    }
}

/// Identifies one model artifact: (annotator kind, language, version).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub kind: ModelKind,
    pub language: Language,
    pub version: String,
}

impl ArtifactKey {
    pub fn new(kind: ModelKind, language: Language, version: impl Into<String>) -> Self {
        Self {
            kind,
            language,
            version: version.into(),
        }
    }

    /// Relative storage key, shared by the remote store and the local cache.
    pub fn storage_key(&self) -> String {
        format!(
            "dist/models/rules/{}/{}/{}.json",
            self.version,
            self.language.code(),
            self.kind.label()
        )
    }
}

/// Fetches artifact bytes by key. Implemented over HTTP in production and
/// by in-memory fakes in tests.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError>;
}

/// Artifact source backed by an HTTP(S) model repository.
pub struct HttpArtifactSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArtifactSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.storage_key()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArtifactError::Transfer(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ArtifactError::NotFound(key.storage_key()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| ArtifactError::Transfer(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArtifactError::Transfer(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
