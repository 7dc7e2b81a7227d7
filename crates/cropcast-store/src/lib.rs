//! Storage layer: persisted model artifacts on the local filesystem.

mod error;
pub use error::StoreError;

mod fs;
pub use fs::ArtifactStore;
