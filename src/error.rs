//! Top-level error type composing every component crate's error enum.
//!
//! Each subsystem keeps its own `thiserror` enum, and this crate only adds
//! the glue (`#[from]`) so a CLI or embedder can match on one type without
//! losing the subsystem detail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlmError {
    #[error(transparent)]
    Config(#[from] almwork_config::ConfigError),

    #[error(transparent)]
    Canon(#[from] almwork_canon::CanonError),

    #[error(transparent)]
    Graph(#[from] almwork_graph::GraphError),

    #[error(transparent)]
    Store(#[from] almwork_store::StoreError),

    #[error(transparent)]
    Signature(#[from] almwork_signatures::SignatureError),

    #[error(transparent)]
    Sprint(#[from] almwork_sprint::SprintError),

    #[error(transparent)]
    Scheduler(#[from] almwork_scheduler::SchedulerError),

    #[error(transparent)]
    Matcher(#[from] almwork_matcher::MatcherError),

    #[error(transparent)]
    Email(#[from] almwork_email::EmailError),

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, AlmError>;
