use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{HealthResponse, StatsResponse};
use crate::domain::errors::DomainError;

pub const IMAGE_FIELD: &str = "image";

fn too_large(limit: usize) -> ApiError {
    DomainError::InvalidInput(format!("Upload exceeds {limit} bytes")).into()
}

/// Pulls the `image` field out of the multipart body, enforcing the upload ceiling first.
async fn read_image_field(
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(too_large(limit));
    }

    let mut multipart = multipart.map_err(|e| DomainError::InvalidInput(format!("No image uploaded: {e}")))?;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(DomainError::InvalidInput("No image uploaded".into()).into()),
            Err(e) if e.status().as_u16() == 413 => return Err(too_large(limit)),
            Err(e) => return Err(DomainError::InvalidInput(format!("Malformed upload: {}", e.body_text())).into()),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        return match field.bytes().await {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) if e.status().as_u16() == 413 => Err(too_large(limit)),
            Err(e) => Err(DomainError::InvalidInput(format!("Malformed upload: {}", e.body_text())).into()),
        };
    }
}

pub async fn detect(
    State(st): State<HttpState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let bytes = read_image_field(&headers, multipart, st.max_upload_bytes).await?;
    let outcome = st.detection.process_upload(bytes).await?;

    let mut response = outcome.jpeg.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert("x-violations", HeaderValue::from(outcome.violations));
    headers.insert("x-daily-total", HeaderValue::from(outcome.daily_total));
    Ok(response)
}

pub async fn stats(State(st): State<HttpState>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(st.detection.stats()?))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
