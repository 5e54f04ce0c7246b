//! textlayer - staged natural-language annotation pipeline.
//!
//! Given raw text and a target language, produces layered span annotations
//! (sentence boundaries, tokens, part-of-speech tags, named entities) from
//! per-language rule packs that are downloaded on demand, cached on disk and
//! in memory, and shared safely across concurrent runs.

pub mod annotation;
pub mod backends;
pub mod config;
pub mod language;
pub mod models;
pub mod pipeline;
pub mod stage;

pub use annotation::{Annotation, Span};
pub use config::PipelineConfig;
pub use language::Language;
pub use models::{
    ArtifactError, ArtifactKey, ArtifactSource, HttpArtifactSource, ModelKind, ModelStore,
    RetainPolicy,
};
pub use pipeline::{Pipeline, PipelineError};
pub use stage::Stage;
