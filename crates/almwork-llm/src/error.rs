#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm backend is disabled")]
    Disabled,

    #[error("request body is empty")]
    EmptyBody,

    #[error("llm request timed out after {0}s")]
    Timeout(u64),

    #[error("llm http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("llm returned a response that could not be parsed as json: {0}")]
    InvalidJson(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
