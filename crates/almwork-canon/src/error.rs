use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanonError {
    #[error("failed to serialize value to JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to canonicalize JSON using JCS: {0}")]
    Jcs(String),

    #[error("JCS output contained invalid UTF-8: {0}")]
    NonUtf8(#[from] std::string::FromUtf8Error),

    #[error("failed to parse PKCS#8 private key: {0}")]
    KeyParse(String),

    #[error("RSA-PSS signing failed: {0}")]
    Sign(String),

    #[error("RSA-PSS signature verification failed: {0}")]
    Verify(String),

    #[error("invalid hex encoding: {0}")]
    Hex(String),
}
