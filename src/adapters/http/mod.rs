pub mod error;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/detect", post(routes::detect).layer(upload_limit))
        .route("/stats", get(routes::stats))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
