use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("work item {0} not found")]
    WorkItemNotFound(Uuid),

    #[error("signature {0} not found")]
    SignatureNotFound(Uuid),

    #[error("canonicalization or cryptographic operation failed: {0}")]
    Canon(#[from] almwork_canon::CanonError),

    #[error("graph backend error: {0}")]
    Graph(#[from] almwork_graph::GraphError),

    #[error("work-item store error: {0}")]
    Store(#[from] almwork_store::StoreError),

    #[error("signature row failed to (de)serialize: {0}")]
    Codec(String),
}
