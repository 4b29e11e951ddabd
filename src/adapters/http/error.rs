use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::errors::DomainError;

/// Maps domain failures onto status codes with a short plain-text body.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DomainError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            DomainError::Inference(msg) => {
                tracing::error!("Inference error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model inference error".to_string())
            }
            DomainError::InvalidDetection(msg) => {
                tracing::error!("Detector returned malformed output: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Model inference error".to_string())
            }
            DomainError::Aggregation(msg) => {
                tracing::error!("Counter error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            DomainError::OperationFailed(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, message).into_response()
    }
}
