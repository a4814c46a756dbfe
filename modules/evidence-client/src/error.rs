use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvidenceError>;

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl EvidenceError {
    /// Every provider failure is transient from the pipeline's point of
    /// view except a malformed payload, which retrying will not fix.
    pub fn is_transient(&self) -> bool {
        !matches!(self, EvidenceError::Parse(_))
    }
}

impl From<reqwest::Error> for EvidenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EvidenceError::Timeout(err.to_string())
        } else if err.is_decode() {
            EvidenceError::Parse(err.to_string())
        } else {
            EvidenceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        EvidenceError::Parse(err.to_string())
    }
}
