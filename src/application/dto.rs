use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of `GET /stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub date: NaiveDate,
    pub no_helmet: u64,
    /// Informational only, `HH:MM:SS`.
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Result of one `/detect` request.
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub jpeg: Vec<u8>,
    pub detections: usize,
    pub violations: u64,
    pub daily_total: u64,
}
