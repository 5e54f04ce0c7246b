//! Model artifact acquisition and per-language in-memory caching.

mod artifact;
mod store;

pub use artifact::{
    ArtifactError, ArtifactKey, ArtifactSource, HttpArtifactSource, ModelKind, ARTIFACT_VERSION,
};
pub use store::{ModelStore, RetainPolicy};
