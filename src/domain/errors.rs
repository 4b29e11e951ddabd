use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Malformed detection: {0}")]
    InvalidDetection(String),
    #[error("Daily counter unavailable: {0}")]
    Aggregation(String),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl DomainError {
    /// True for failures caused by the caller's upload rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::InvalidInput(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
