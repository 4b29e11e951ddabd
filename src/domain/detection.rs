use serde::{Deserialize, Serialize};

/// Pixel-space box with `x1 < x2` and `y1 < y2` once validated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x1 >= 0
            && self.y1 >= 0
            && self.x1 < self.x2
            && self.y1 < self.y2
            && (self.x2 as i64) <= (width as i64)
            && (self.y2 as i64) <= (height as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, class_id: usize, confidence: f32, bbox: BoundingBox) -> Self {
        Self { label: label.into(), class_id, confidence, bbox }
    }
}
