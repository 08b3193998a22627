use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(Uuid),

    #[error("duplicate node id {0}")]
    DuplicateNode(Uuid),

    #[error("query execution failed: {0}")]
    Query(String),

    #[error("backend error: {0}")]
    Backend(String),
}
