//! Environment-driven settings.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::domain::model::{InferenceConfig, ModelId, YoloParams};
use crate::domain::violation::{ViolationPolicy, DEFAULT_VIOLATION_LABELS};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address, `host:port`.
    pub bind: String,
    pub inference: InferenceConfig,
    pub violation_labels: Vec<String>,
    pub max_upload_bytes: usize,
    /// Directory served for `/` and other unmatched paths.
    pub static_dir: String,
    pub jpeg_quality: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            inference: InferenceConfig {
                model: ModelId {
                    name: "helmet".to_string(),
                    onnx_path: "models/helmet.onnx".to_string(),
                },
                labels: vec!["helmet".to_string(), "no helmet".to_string()],
                params: YoloParams::default(),
            },
            violation_labels: DEFAULT_VIOLATION_LABELS.iter().map(|s| s.to_string()).collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: "static".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl AppConfig {
    /// Load configuration from `HELMET_*` environment variables, keeping defaults for unset ones.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(bind) = lookup("HELMET_BIND") {
            cfg.bind = bind;
        }
        if let Some(path) = lookup("HELMET_MODEL_PATH") {
            cfg.inference.model.name = std::path::Path::new(&path)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| cfg.inference.model.name.clone());
            cfg.inference.model.onnx_path = path;
        }
        if let Some(labels) = lookup("HELMET_MODEL_LABELS") {
            cfg.inference.labels = split_list(&labels);
        }
        if let Some(labels) = lookup("HELMET_VIOLATION_LABELS") {
            cfg.violation_labels = split_list(&labels);
        }
        if let Some(dir) = lookup("HELMET_STATIC_DIR") {
            cfg.static_dir = dir;
        }

        let params = &mut cfg.inference.params;
        params.conf_threshold = parsed(&lookup, "HELMET_CONF_THRESHOLD", params.conf_threshold);
        params.iou_threshold = parsed(&lookup, "HELMET_IOU_THRESHOLD", params.iou_threshold);
        params.input_size = parsed(&lookup, "HELMET_INPUT_SIZE", params.input_size);
        params.max_detections = parsed(&lookup, "HELMET_MAX_DETECTIONS", params.max_detections);
        cfg.max_upload_bytes = parsed(&lookup, "HELMET_MAX_UPLOAD_BYTES", cfg.max_upload_bytes);
        cfg.jpeg_quality = parsed(&lookup, "HELMET_JPEG_QUALITY", cfg.jpeg_quality);

        cfg
    }

    pub fn violation_policy(&self) -> ViolationPolicy {
        ViolationPolicy::new(&self.violation_labels)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{}={:?} is not valid, using {}", key, raw, default);
            default
        }),
    }
}
