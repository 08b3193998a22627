use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("milestone {0} not found")]
    NotFound(Uuid),

    #[error("work item {0} not found")]
    WorkItemNotFound(Uuid),

    #[error("adding this dependency would create a cycle")]
    CycleWouldForm,

    #[error("resource {0} is already allocated to a {1:?}; cannot mix allocation kinds")]
    AllocationKindConflict(Uuid, crate::allocation::AllocationKind),

    #[error("graph backend error: {0}")]
    Graph(#[from] almwork_graph::GraphError),

    #[error("work-item store error: {0}")]
    Store(#[from] almwork_store::StoreError),

    #[error("row failed to (de)serialize: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, MatcherError>;
