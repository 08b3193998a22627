use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("work item {0} not found")]
    WorkItemNotFound(Uuid),

    #[error("no valid recipients provided; rejected: {0:?}")]
    NoValidRecipients(Vec<String>),

    #[error("email thread for work item {0} not found")]
    ThreadNotFound(Uuid),

    #[error("failed to connect to imap server: {0}")]
    ImapConnect(String),

    #[error("imap operation failed: {0}")]
    Imap(String),

    #[error("failed to parse message body: {0}")]
    Parse(String),

    #[error("failed to send email: {0}")]
    Send(String),

    #[error("email polling is already active")]
    AlreadyPolling,

    #[error("graph backend error: {0}")]
    Graph(#[from] almwork_graph::GraphError),

    #[error("work-item store error: {0}")]
    Store(#[from] almwork_store::StoreError),

    #[error("row failed to (de)serialize: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, EmailError>;
