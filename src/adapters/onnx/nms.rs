/// Raw detector output in source-image pixels, before clipping and rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn intersection_area(&self, other: &Candidate) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Greedy per-class suppression, highest score first, capped at `max_detections`.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32, max_detections: usize) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len().min(max_detections));
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && k.iou(&cand) > iou_threshold);
        if !overlaps {
            kept.push(cand);
        }
    }
    kept
}
