//! Zero-shot text classifier client
//!
//! Sends a free-text issue description to the hosted zero-shot inference
//! endpoint with the fixed candidate label set and returns the raw JSON
//! answer. Shape reconciliation is left to
//! [`response_normalizer`](super::response_normalizer).
//!
//! # API Reference
//! - Default endpoint: https://api-inference.huggingface.co/models/valhalla/distilbart-mnli-12-3
//! - Payload: `{"inputs": text, "parameters": {"candidate_labels": [...], "multi_label": false}}`
//!
//! One attempt per request, no retries.

use civic_common::config::TextClassifierSettings;
use civic_common::CANDIDATE_LABELS;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Text classifier errors
///
/// The display string is the detail reported to API callers.
#[derive(Debug, Error)]
pub enum TextClassifierError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{status} for url: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("invalid JSON in response: {0}")]
    Decode(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [&'a str],
    multi_label: bool,
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

/// Client for the remote zero-shot classification endpoint
pub struct TextClassifierClient {
    http_client: Client,
    endpoint: String,
    timeout: Duration,
    api_token: Option<String>,
}

impl TextClassifierClient {
    pub fn new(settings: TextClassifierSettings) -> Result<Self, TextClassifierError> {
        let http_client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| TextClassifierError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: settings.endpoint,
            timeout: settings.timeout,
            api_token: settings.api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_token.is_some()
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> TextClassifierError {
        if e.is_timeout() {
            TextClassifierError::Timeout {
                url: self.endpoint.clone(),
                timeout: self.timeout,
            }
        } else if e.is_decode() {
            TextClassifierError::Decode(e.to_string())
        } else {
            TextClassifierError::Transport(e.to_string())
        }
    }

    /// Classify `text` against the candidate label set
    ///
    /// Returns the raw response body on 2xx. Non-2xx status, transport
    /// errors, timeouts and non-JSON bodies are all errors.
    pub async fn classify(&self, text: &str) -> Result<Value, TextClassifierError> {
        let payload = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: &CANDIDATE_LABELS,
                multi_label: false,
            },
        };

        debug!(
            endpoint = %self.endpoint,
            text_length = text.len(),
            authenticated = self.is_authenticated(),
            "Querying zero-shot text classifier"
        );

        let mut request = self.http_client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Zero-shot classifier returned error status");
            return Err(TextClassifierError::Status {
                status,
                url: self.endpoint.clone(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| TextClassifierError::Decode(e.to_string()))
    }
}
