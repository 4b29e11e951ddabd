use serde::{Deserialize, Serialize};

use super::detection::{BoundingBox, Detection};
use super::errors::{DomainError, DomainResult};

pub const DEFAULT_VIOLATION_LABELS: [&str; 3] = ["no helmet", "without helmet", "no-helmet"];

pub const VIOLATION_TEXT: &str = "NO HELMET";
pub const VIOLATION_COLOR: [u8; 3] = [255, 0, 0];
pub const VIOLATION_STROKE: u32 = 2;
pub const VIOLATION_TEXT_SCALE: f32 = 0.7;
/// Distance between the box's top edge and the label baseline.
pub const LABEL_OFFSET_PX: i32 = 10;

/// Allow-list of model labels that mean "person without a helmet".
///
/// Matching is exact after trimming and lower-casing both sides; no substring or fuzzy matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationPolicy {
    labels: Vec<String>,
}

impl ViolationPolicy {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = labels
            .into_iter()
            .map(|l| normalize(l.as_ref()))
            .filter(|l| !l.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self { labels: normalized }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_violation(&self, label: &str) -> bool {
        let label = normalize(label);
        self.labels.iter().any(|l| *l == label)
    }

    /// Splits one image's detections into violations and their drawing instructions.
    ///
    /// Every detection is checked against the image bounds first; a malformed one fails the whole
    /// request instead of being clamped or skipped.
    pub fn classify(&self, detections: &[Detection], width: u32, height: u32) -> DomainResult<Classification> {
        let mut annotations = Vec::new();
        for det in detections {
            if !det.bbox.is_within(width, height) {
                return Err(DomainError::InvalidDetection(format!(
                    "'{}' box {:?} outside {}x{} image",
                    det.label, det.bbox, width, height
                )));
            }
            if self.is_violation(&det.label) {
                annotations.push(Annotation::violation(det.bbox));
            }
        }
        Ok(Classification { violations: annotations.len() as u64, annotations })
    }
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VIOLATION_LABELS)
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Rectangle plus caption to burn into the response image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub rect: BoundingBox,
    pub text: String,
    /// Left end of the text baseline; may lie above the image.
    pub text_origin: (i32, i32),
    pub color: [u8; 3],
    pub stroke: u32,
    pub text_scale: f32,
}

impl Annotation {
    pub fn violation(rect: BoundingBox) -> Self {
        Self {
            rect,
            text: VIOLATION_TEXT.to_string(),
            text_origin: (rect.x1, rect.y1 - LABEL_OFFSET_PX),
            color: VIOLATION_COLOR,
            stroke: VIOLATION_STROKE,
            text_scale: VIOLATION_TEXT_SCALE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub violations: u64,
    pub annotations: Vec<Annotation>,
}
