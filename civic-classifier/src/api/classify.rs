//! Classification endpoints
//!
//! - `POST /classify-image`: multipart upload, field `file`
//! - `POST /classify-text`: JSON body `{"text": "..."}`
//!
//! Both answer `{"classification": <label>, "confidence": <float>}` on
//! success and `{"error": <message>}` otherwise.

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use civic_common::api::types::{
    ClassificationResponse, ClassifyTextRequest, IMAGE_CLASSIFICATION_FAILED, MISSING_TEXT_FIELD,
    NO_FILE_UPLOADED, PAYLOAD_TOO_LARGE, TEXT_CLASSIFICATION_FAILED, UNEXPECTED_TEXT_RESPONSE,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::normalize;
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the photo
const FILE_FIELD: &str = "file";

/// Over-limit bodies are 413; any other unreadable body counts as no upload
fn multipart_failure(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        debug!("Upload exceeds size limit: {}", e);
        ApiError::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_string())
    } else {
        debug!("Malformed multipart body: {}", e);
        ApiError::BadRequest(NO_FILE_UPLOADED.to_string())
    }
}

/// Pull the `file` field out of a multipart body
///
/// A body that is not multipart, or is malformed, counts as no upload.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Bytes> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Image request is not multipart: {}", e);
        ApiError::BadRequest(NO_FILE_UPLOADED.to_string())
    })?;

    loop {
        let field = multipart.next_field().await.map_err(multipart_failure)?;

        match field {
            Some(field) if field.name() == Some(FILE_FIELD) => {
                return field.bytes().await.map_err(multipart_failure);
            }
            Some(_) => continue,
            None => return Err(ApiError::BadRequest(NO_FILE_UPLOADED.to_string())),
        }
    }
}

/// POST /classify-image
pub async fn classify_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ClassificationResponse>> {
    let bytes = read_file_field(multipart).await?;
    debug!(size_bytes = bytes.len(), "Received image upload");

    let classifier = state.image_classifier.clone();
    let result = tokio::task::spawn_blocking(move || classifier.classify(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {}", IMAGE_CLASSIFICATION_FAILED, e)))?
        .map_err(|e| {
            warn!("Image classification failed: {}", e);
            ApiError::Internal(format!("{}: {}", IMAGE_CLASSIFICATION_FAILED, e))
        })?;

    info!(
        classification = %result.label,
        confidence = result.confidence,
        "Image classified"
    );
    Ok(Json(result.into()))
}

/// Decode a text request; only a JSON object with a string `text` qualifies
fn parse_text_request(body: &[u8]) -> Option<ClassifyTextRequest> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Text request body is not JSON: {}", e);
            return None;
        }
    };
    if !value.is_object() {
        debug!("Text request body is not a JSON object");
        return None;
    }
    serde_json::from_value(value)
        .map_err(|e| debug!("Text request lacks 'text': {}", e))
        .ok()
}

/// POST /classify-text
pub async fn classify_text(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ClassificationResponse>> {
    let body = body.map_err(|e| {
        debug!("Failed to read text request body: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(PAYLOAD_TOO_LARGE.to_string())
        } else {
            ApiError::BadRequest(MISSING_TEXT_FIELD.to_string())
        }
    })?;
    let request = parse_text_request(&body)
        .ok_or_else(|| ApiError::BadRequest(MISSING_TEXT_FIELD.to_string()))?;

    let raw = state
        .text_client
        .classify(&request.text)
        .await
        .map_err(|e| {
            warn!("Text classification failed: {}", e);
            ApiError::Upstream(format!("{}: {}", TEXT_CLASSIFICATION_FAILED, e))
        })?;

    let result = normalize(&raw).map_err(|_| {
        warn!(response = %raw, "Unrecognized text classifier response");
        ApiError::Upstream(UNEXPECTED_TEXT_RESPONSE.to_string())
    })?;

    info!(
        classification = %result.label,
        confidence = result.confidence,
        "Text classified"
    );
    Ok(Json(result.into()))
}

/// Build classification routes
pub fn classify_routes() -> Router<AppState> {
    Router::new()
        .route("/classify-image", post(classify_image))
        .route("/classify-text", post(classify_text))
}
