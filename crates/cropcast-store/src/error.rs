use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model artifact not found: {0}")]
    ArtifactNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not persist artifact: {0}")]
    Persist(#[from] tempfile::PersistError),
}
