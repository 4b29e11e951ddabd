use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use helmet_watch::adapters::{
    clock::SystemClock,
    http::{router, state::HttpState},
    imaging::codec::JpegImaging,
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
};
use helmet_watch::application::services::{DetectionService, ModelService};
use helmet_watch::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG, info by default) and settings
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let policy = config.violation_policy();
    tracing::info!("Model: {}", config.inference.model.onnx_path);
    tracing::info!("Model labels: {:?}", config.inference.labels);
    tracing::info!("Violation labels: {:?}", policy.labels());

    // 2. Infrastructure adapters. The model is validated before the session is built.
    ModelService::new(Arc::new(OnnxModelCatalog::new()))
        .ensure_ready(&config.inference)
        .await?;
    let detector = Arc::new(OnnxDetector::load(&config.inference)?);
    let imaging = Arc::new(JpegImaging::new(config.jpeg_quality));
    let clock = Arc::new(SystemClock::new());

    // 3. Use case; owns the daily counter for the life of the process
    let detection = Arc::new(DetectionService::new(
        detector,
        imaging,
        clock,
        policy,
        config.inference.params.clone(),
    ));

    let state = HttpState {
        detection,
        max_upload_bytes: config.max_upload_bytes,
    };

    // 4. API routes plus the operator page
    let app = router(state).fallback_service(ServeDir::new(&config.static_dir));

    tracing::info!("🚀 Helmet server listening on http://{}", config.bind);
    tracing::info!("📂 Static files served from './{}'", config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
