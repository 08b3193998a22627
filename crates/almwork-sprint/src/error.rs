use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SprintError {
    #[error("sprint {0} not found")]
    NotFound(Uuid),

    #[error("work item {0} not found")]
    WorkItemNotFound(Uuid),

    #[error("cannot transition sprint {0} from {1} to {2}")]
    InvalidTransition(Uuid, &'static str, &'static str),

    #[error("project {0} already has an active sprint")]
    ActiveSprintExists(String),

    #[error("assigning work item {0} to sprint {1} would exceed sprint capacity")]
    CapacityExceeded(Uuid, Uuid),

    #[error("work item {0} is not ready; cannot return it to the backlog")]
    TaskNotReady(Uuid),

    #[error("graph backend error: {0}")]
    Graph(#[from] almwork_graph::GraphError),

    #[error("work-item store error: {0}")]
    Store(#[from] almwork_store::StoreError),

    #[error("sprint row failed to (de)serialize: {0}")]
    Codec(String),
}
