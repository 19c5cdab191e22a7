//! Error types for civic-classifier
//!
//! Every error leaves the service as `{"error": "<message>"}` with the
//! status code of its variant.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use civic_common::api::types::ErrorResponse;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Request body over the size limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Remote classifier failed or answered unusably (502)
    #[error("{0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// civic-common error
    #[error("Common error: {0}")]
    Common(#[from] civic_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_)
            | ApiError::Io(_)
            | ApiError::Other(_)
            | ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse::new(self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_body_is_bare_message() {
        let (status, body) = body_json(ApiError::BadRequest("No file uploaded".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_upstream_maps_to_bad_gateway() {
        let (status, body) = body_json(ApiError::Upstream("down".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "down");
    }

    #[tokio::test]
    async fn test_payload_too_large_status() {
        let (status, body) =
            body_json(ApiError::PayloadTooLarge("Request body too large".into())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, serde_json::json!({"error": "Request body too large"}));
    }

    #[tokio::test]
    async fn test_io_maps_to_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let (status, body) = body_json(ApiError::from(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "IO error: disk");
    }
}
