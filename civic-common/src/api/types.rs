//! Shared API request/response types
//!
//! The JSON shapes here are the public contract of `/classify-image` and
//! `/classify-text`; field names must not change.

use serde::{Deserialize, Serialize};

/// 400 body when the multipart request has no `file` field
pub const NO_FILE_UPLOADED: &str = "No file uploaded";

/// 413 body when the request exceeds the upload size limit
pub const PAYLOAD_TOO_LARGE: &str = "Request body too large";

/// 400 body when the text request is not JSON or lacks `text`
pub const MISSING_TEXT_FIELD: &str = "Send JSON with 'text' field";

/// 502 body when the remote classifier answered with an unknown shape
pub const UNEXPECTED_TEXT_RESPONSE: &str = "Unexpected response format from text classifier";

/// Prefix of the 502 body when the remote classifier call failed
pub const TEXT_CLASSIFICATION_FAILED: &str = "Text classification failed";

/// Prefix of the 500 body when an uploaded image could not be classified
pub const IMAGE_CLASSIFICATION_FAILED: &str = "Image classification failed";

/// Successful classification (200)
///
/// # Examples
///
/// ```
/// use civic_common::api::types::ClassificationResponse;
///
/// let body = ClassificationResponse {
///     classification: "Trash".to_string(),
///     confidence: 0.93,
/// };
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["classification"], "Trash");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassificationResponse {
    /// Winning label
    pub classification: String,

    /// Probability or score of the winning label
    pub confidence: f64,
}

/// Error body for every non-200 response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Body of `POST /classify-text`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyTextRequest {
    pub text: String,
}
