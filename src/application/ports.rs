use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use image::RgbImage;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    model::{ModelId, YoloParams},
    violation::Annotation,
};

/// Object detector. Confidence filtering at `params.conf_threshold` is the detector's job.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: Arc<RgbImage>, params: &YoloParams) -> DomainResult<Vec<Detection>>;
}

/// Upload decoding and response encoding. Called from blocking worker threads.
pub trait ImagingPort: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage>;
    fn render_jpeg(&self, image: RgbImage, annotations: &[Annotation]) -> DomainResult<Vec<u8>>;
}

pub trait ClockPort: Send + Sync {
    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
