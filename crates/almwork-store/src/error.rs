use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("work item {0} not found")]
    NotFound(Uuid),

    #[error("version {1} of work item {0} not found")]
    VersionNotFound(Uuid, String),

    #[error("work item {0} has valid signatures; delete refused without force")]
    SignatureExists(Uuid),

    #[error("graph backend error: {0}")]
    Graph(#[from] almwork_graph::GraphError),

    #[error("signature service error: {0}")]
    Signature(#[from] anyhow::Error),
}
