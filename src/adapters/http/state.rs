use std::sync::Arc;
use crate::application::services::DetectionService;

/// Shared state for the axum handlers: the use-case service plus transport limits.
#[derive(Clone)]
pub struct HttpState {
    /// Upload pipeline and the daily counter it feeds.
    pub detection: Arc<DetectionService>,
    /// Ceiling for a `/detect` request body, checked before any decoding.
    pub max_upload_bytes: usize,
}
