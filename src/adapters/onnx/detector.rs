use async_trait::async_trait;
use image::RgbImage;
use std::sync::{Arc, Mutex};

use super::nms::Candidate;
use super::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::{BoundingBox, Detection},
    errors::{DomainError, DomainResult},
    model::{InferenceConfig, YoloParams},
};

/// `DetectorPort` backed by one ONNX session shared by all requests.
///
/// `Session::run` needs exclusive access, so concurrent uploads queue on the engine mutex inside
/// a blocking worker.
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
    labels: Arc<Vec<String>>,
}

impl OnnxDetector {
    pub fn load(infer: &InferenceConfig) -> DomainResult<Self> {
        let engine = OnnxYoloEngine::load(&infer.model.onnx_path)
            .map_err(|e| DomainError::Inference(format!("loading {}: {e:#}", infer.model.onnx_path)))?;
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            labels: Arc::new(infer.labels.clone()),
        })
    }
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image: Arc<RgbImage>, params: &YoloParams) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();
        let labels = self.labels.clone();
        let params = params.clone();

        tokio::task::spawn_blocking(move || {
            let candidates = {
                let mut engine = engine
                    .lock()
                    .map_err(|_| DomainError::Inference("engine lock poisoned".into()))?;
                engine
                    .infer(&image, &params)
                    .map_err(|e| DomainError::Inference(format!("{e:#}")))?
            };
            to_detections(&candidates, &labels, image.width(), image.height())
        })
        .await
        .map_err(|e| DomainError::Inference(format!("inference worker failed: {e}")))?
    }
}

/// Clips candidates to the frame and rounds them to whole pixels.
///
/// Boxes that collapse after clipping are dropped; non-finite coordinates mean the model output
/// is corrupt and fail the request.
pub fn to_detections(candidates: &[Candidate], labels: &[String], width: u32, height: u32) -> DomainResult<Vec<Detection>> {
    let mut out = Vec::with_capacity(candidates.len());
    for c in candidates {
        if ![c.x1, c.y1, c.x2, c.y2].iter().all(|v| v.is_finite()) {
            return Err(DomainError::InvalidDetection(format!("non-finite box for class {}", c.class_id)));
        }
        let clip = |v: f32, max: u32| v.clamp(0.0, max as f32).round() as i32;
        let bbox = BoundingBox::new(clip(c.x1, width), clip(c.y1, height), clip(c.x2, width), clip(c.y2, height));
        if bbox.x1 >= bbox.x2 || bbox.y1 >= bbox.y2 {
            continue;
        }
        let label = labels
            .get(c.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", c.class_id));
        out.push(Detection::new(label, c.class_id, c.score, bbox));
    }
    Ok(out)
}
