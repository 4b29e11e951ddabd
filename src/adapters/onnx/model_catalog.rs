use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

/// Checks that a helmet model is present on disk before the session is built.
pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        let path = Path::new(model.onnx_path.trim());
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidInput(format!("no model path configured for '{}'", model.name)));
        }
        if path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            return Err(DomainError::InvalidInput(format!("{} is not an .onnx export", path.display())));
        }
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| DomainError::NotFound(format!("model file not found: {}", path.display())))?;
        if !meta.is_file() || meta.len() == 0 {
            return Err(DomainError::InvalidInput(format!("{} is empty or not a file", path.display())));
        }
        Ok(())
    }
}
