//! Per-language model cache with download-on-demand loading.
//!
//! One store exists per annotator kind. Each language gets its own slot
//! guarded by its own async lock, so concurrent loads of different
//! languages never contend; concurrent loads of the same language collapse
//! into one download-and-deserialize sequence, with the losers waiting and
//! then hitting the warm cache.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::artifact::{ArtifactKey, ArtifactSource, ModelKind};
use crate::language::Language;

/// Whether a store keeps loaded models in memory after `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetainPolicy {
    /// Keep models cached across runs; `release` is a no-op.
    #[default]
    Keep,
    /// Drop the model on `release`, freeing its memory.
    Evict,
}

type Slot<M> = Arc<tokio::sync::Mutex<Option<Arc<M>>>>;

/// Resolves a language to a loaded model, downloading and caching on first
/// use. `M` is the deserialized rule pack type for this store's kind.
pub struct ModelStore<M> {
    kind: ModelKind,
    source: Arc<dyn ArtifactSource>,
    model_dir: PathBuf,
    version: String,
    retain: RetainPolicy,
    slots: Mutex<HashMap<Language, Slot<M>>>,
    loads: AtomicUsize,
}

impl<M: DeserializeOwned + Send + Sync + 'static> ModelStore<M> {
    pub fn new(
        kind: ModelKind,
        source: Arc<dyn ArtifactSource>,
        model_dir: PathBuf,
        version: impl Into<String>,
        retain: RetainPolicy,
    ) -> Self {
        Self {
            kind,
            source,
            model_dir,
            version: version.into(),
            retain,
            slots: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// The per-language slot. The outer map lock is held only for the
    /// lookup, never across I/O.
    fn slot(&self, language: Language) -> Slot<M> {
        let mut slots = self.slots.lock().expect("slot map lock poisoned");
        slots.entry(language).or_default().clone()
    }

    /// Return a ready-to-use model for `language`, fetching and
    /// deserializing the artifact on first use.
    ///
    /// `None` means the model is unavailable (missing remotely, transfer
    /// failed, or artifact corrupt) — a normal outcome for uncovered
    /// (stage, language) combinations, not a fatal error. A failed load
    /// does not poison the slot; the next call retries the full sequence.
    pub async fn acquire(&self, language: Language) -> Option<Arc<M>> {
        let slot = self.slot(language);
        let mut guard = slot.lock().await;
        if let Some(model) = guard.as_ref() {
            return Some(model.clone());
        }

        let key = ArtifactKey::new(self.kind, language, self.version.clone());
        let path = self.model_dir.join(key.storage_key());
        if !path.exists() {
            info!(
                kind = self.kind.label(),
                language = language.code(),
                "downloading model artifact"
            );
            let bytes = match self.source.fetch(&key).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        kind = self.kind.label(),
                        language = language.code(),
                        error = %e,
                        "model artifact fetch failed"
                    );
                    return None;
                }
            };
            if let Err(e) = path
                .parent()
                .map(std::fs::create_dir_all)
                .transpose()
                .and_then(|_| std::fs::write(&path, &bytes))
            {
                warn!(
                    kind = self.kind.label(),
                    language = language.code(),
                    error = %e,
                    "failed to cache model artifact on disk"
                );
                return None;
            }
        }

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    kind = self.kind.label(),
                    language = language.code(),
                    error = %e,
                    "failed to read cached model artifact"
                );
                return None;
            }
        };
        let model: M = match serde_json::from_slice(&bytes) {
            Ok(model) => model,
            Err(e) => {
                // The corrupt local copy is left in place for inspection.
                warn!(
                    kind = self.kind.label(),
                    language = language.code(),
                    error = %e,
                    "model artifact failed to deserialize"
                );
                return None;
            }
        };

        let model = Arc::new(model);
        *guard = Some(model.clone());
        self.loads.fetch_add(1, Ordering::Relaxed);
        info!(
            kind = self.kind.label(),
            language = language.code(),
            "loaded model"
        );
        Some(model)
    }

    /// Evict the cached model for `language` when the retain policy is
    /// `Evict`; no-op otherwise. Safe to call with no prior load.
    pub async fn release(&self, language: Language) {
        if self.retain == RetainPolicy::Keep {
            return;
        }
        let slot = self.slot(language);
        let mut guard = slot.lock().await;
        if guard.take().is_some() {
            debug!(
                kind = self.kind.label(),
                language = language.code(),
                "evicted model"
            );
        }
    }

    /// Number of completed load sequences since construction.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}
