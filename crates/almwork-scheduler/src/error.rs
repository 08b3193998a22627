use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("project {0} has no stored schedule")]
    NoSchedule(String),

    #[error("task {0} not found in the last stored schedule")]
    UnknownTask(Uuid),

    #[error("solve timed out after {0}s")]
    Timeout(u64),

    #[error("solver task panicked")]
    SolverPanicked,
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
