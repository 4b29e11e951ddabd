// HTTP API tests
// Drive the real router with a scripted detector and a clock the test can move forward.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use helmet_watch::{
    adapters::{
        http::{router, state::HttpState},
        imaging::codec::JpegImaging,
    },
    application::{
        ports::{ClockPort, DetectorPort},
        services::DetectionService,
    },
    domain::{
        detection::{BoundingBox, Detection},
        errors::{DomainError, DomainResult},
        model::YoloParams,
        violation::ViolationPolicy,
    },
};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;

const BOUNDARY: &str = "helmet-watch-test-boundary";

#[derive(Default)]
struct ScriptedDetector {
    detections: Mutex<Vec<Detection>>,
    fail: AtomicBool,
}

impl ScriptedDetector {
    fn set(&self, detections: Vec<Detection>) {
        *self.detections.lock().unwrap() = detections;
    }
}

#[async_trait]
impl DetectorPort for ScriptedDetector {
    async fn detect(&self, _image: Arc<RgbImage>, _params: &YoloParams) -> DomainResult<Vec<Detection>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::Inference("session run failed".into()));
        }
        Ok(self.detections.lock().unwrap().clone())
    }
}

struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

struct Harness {
    app: Router,
    detector: Arc<ScriptedDetector>,
    clock: Arc<ManualClock>,
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap().and_hms_opt(23, 58, 30).unwrap()
}

fn harness_with_limit(max_upload_bytes: usize) -> Harness {
    let detector = Arc::new(ScriptedDetector::default());
    let clock = Arc::new(ManualClock(Mutex::new(start())));
    let service = DetectionService::new(
        detector.clone(),
        Arc::new(JpegImaging::default()),
        clock.clone(),
        ViolationPolicy::default(),
        YoloParams::default(),
    );
    let state = HttpState { detection: Arc::new(service), max_upload_bytes };
    Harness { app: router(state), detector, clock }
}

fn harness() -> Harness {
    harness_with_limit(5 * 1024 * 1024)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"frame.png\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(field, bytes)))
        .unwrap()
}

fn no_helmet(x: i32) -> Detection {
    Detection::new("no helmet", 1, 0.8, BoundingBox::new(x, 20, x + 8, 40))
}

fn helmet() -> Detection {
    Detection::new("helmet", 0, 0.9, BoundingBox::new(2, 2, 12, 18))
}

async fn stats(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_detect_returns_annotated_jpeg_and_counts() {
    let h = harness();
    h.detector.set(vec![helmet(), no_helmet(20)]);

    let response = h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(response.headers()["x-violations"], "1");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body[..2], [0xFF, 0xD8]);
    let decoded = image::load_from_memory_with_format(&body, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));

    assert_eq!(stats(&h.app).await["no_helmet"], 1);
}

#[tokio::test]
async fn test_missing_image_field_is_rejected() {
    let h = harness();
    h.detector.set(vec![no_helmet(20)]);

    let response = h.app.clone().oneshot(upload("file", &png(64, 48))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("No image uploaded"));
    assert_eq!(stats(&h.app).await["no_helmet"], 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(png(8, 8)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_image_is_rejected() {
    let h = harness();
    h.detector.set(vec![no_helmet(20)]);

    let response = h.app.clone().oneshot(upload("image", b"GIF89a-not-really")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stats(&h.app).await["no_helmet"], 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_decoding() {
    let h = harness_with_limit(2048);
    h.detector.set(vec![no_helmet(20)]);

    let response = h.app.clone().oneshot(upload("image", &vec![0u8; 8192])).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stats(&h.app).await["no_helmet"], 0);
}

#[tokio::test]
async fn test_inference_failure_is_server_error_without_counting() {
    let h = harness();
    h.detector.set(vec![no_helmet(20)]);
    h.detector.fail.store(true, Ordering::SeqCst);

    let response = h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stats(&h.app).await["no_helmet"], 0);
}

#[tokio::test]
async fn test_malformed_detection_is_server_error() {
    let h = harness();
    h.detector.set(vec![Detection::new("no helmet", 1, 0.8, BoundingBox::new(10, 10, 500, 20))]);

    let response = h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stats(&h.app).await["no_helmet"], 0);
}

#[tokio::test]
async fn test_stats_on_fresh_day() {
    let h = harness();

    let json = stats(&h.app).await;

    assert_eq!(json["no_helmet"], 0);
    assert_eq!(json["date"], "2026-10-18");
    assert_eq!(json["time"], "23:58:30");
}

#[tokio::test]
async fn test_counter_rolls_over_at_midnight() {
    let h = harness();

    h.detector.set(vec![no_helmet(2), no_helmet(14), no_helmet(26)]);
    let first = h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(stats(&h.app).await["no_helmet"], 3);

    h.clock.advance(Duration::minutes(5));
    h.detector.set(vec![no_helmet(2), no_helmet(30)]);
    let second = h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-daily-total"], "2");

    let json = stats(&h.app).await;
    assert_eq!(json["no_helmet"], 2);
    assert_eq!(json["date"], "2026-10-19");
}

#[tokio::test]
async fn test_stats_rolls_over_on_a_quiet_day() {
    let h = harness();
    h.detector.set(vec![no_helmet(20)]);
    h.app.clone().oneshot(upload("image", &png(64, 48))).await.unwrap();

    h.clock.advance(Duration::days(1));

    let json = stats(&h.app).await;
    assert_eq!(json["no_helmet"], 0);
    assert_eq!(json["date"], "2026-10-19");
}

#[tokio::test]
async fn test_concurrent_uploads_are_all_counted() {
    let h = harness();
    h.detector.set(vec![helmet(), no_helmet(20), no_helmet(40)]);
    let frame = png(64, 48);

    let tasks: Vec<_> = (0..24)
        .map(|_| {
            let app = h.app.clone();
            let request = upload("image", &frame);
            tokio::spawn(async move { app.oneshot(request).await.unwrap().status() })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(stats(&h.app).await["no_helmet"], 48);
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let response = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
