use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, info};

use crate::{
    application::{
        dto::{DetectionOutcome, StatsResponse},
        ports::{ClockPort, DetectorPort, ImagingPort, ModelCatalogPort},
    },
    domain::{
        counter::DailyAggregator,
        errors::{DomainError, DomainResult},
        model::{InferenceConfig, YoloParams},
        violation::ViolationPolicy,
    },
};

/// Orchestrates one upload: decode, detect, classify, annotate, encode, then count.
///
/// The counter is only touched after every fallible step has succeeded, so a failed request
/// never leaves a partial increment behind.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    imaging: Arc<dyn ImagingPort>,
    clock: Arc<dyn ClockPort>,
    aggregator: Arc<DailyAggregator>,
    policy: ViolationPolicy,
    params: YoloParams,
}

impl DetectionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        imaging: Arc<dyn ImagingPort>,
        clock: Arc<dyn ClockPort>,
        policy: ViolationPolicy,
        params: YoloParams,
    ) -> Self {
        let aggregator = Arc::new(DailyAggregator::new(clock.today()));
        Self { detector, imaging, clock, aggregator, policy, params }
    }

    pub fn aggregator(&self) -> &Arc<DailyAggregator> {
        &self.aggregator
    }

    pub async fn process_upload(&self, bytes: Vec<u8>) -> DomainResult<DetectionOutcome> {
        let imaging = self.imaging.clone();
        let image = tokio::task::spawn_blocking(move || imaging.decode(&bytes))
            .await
            .map_err(worker_failed)??;
        let image = Arc::new(image);
        let (width, height) = image.dimensions();

        let detections = self.detector.detect(image.clone(), &self.params).await?;
        let classification = self.policy.classify(&detections, width, height)?;
        debug!(
            width,
            height,
            detections = detections.len(),
            violations = classification.violations,
            "upload classified"
        );

        let imaging = self.imaging.clone();
        let annotations = classification.annotations;
        let image = Arc::try_unwrap(image).unwrap_or_else(|shared| (*shared).clone());
        let jpeg = tokio::task::spawn_blocking(move || imaging.render_jpeg(image, &annotations))
            .await
            .map_err(worker_failed)??;

        let snapshot = self
            .aggregator
            .record_and_rollover(classification.violations, self.clock.today())?;
        if classification.violations > 0 {
            info!(added = classification.violations, total = snapshot.count, date = %snapshot.date, "helmet violations recorded");
        }

        Ok(DetectionOutcome {
            jpeg,
            detections: detections.len(),
            violations: classification.violations,
            daily_total: snapshot.count,
        })
    }

    pub fn stats(&self) -> DomainResult<StatsResponse> {
        let now = self.clock.now();
        let snapshot = self.aggregator.snapshot_at(now.date())?;
        Ok(StatsResponse {
            date: snapshot.date,
            no_helmet: snapshot.count,
            time: now.format("%H:%M:%S").to_string(),
        })
    }
}

fn worker_failed(e: JoinError) -> DomainError {
    DomainError::OperationFailed(format!("image worker failed: {e}"))
}

/// Validates the configured model before the server starts accepting uploads.
#[derive(Clone)]
pub struct ModelService {
    catalog: Arc<dyn ModelCatalogPort>,
}

impl ModelService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn ensure_ready(&self, infer: &InferenceConfig) -> DomainResult<()> {
        self.catalog.validate_model(&infer.model).await?;
        if infer.labels.is_empty() {
            return Err(DomainError::InvalidInput("model label list is empty".into()));
        }
        Ok(())
    }
}
