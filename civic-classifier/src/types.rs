//! Core types for civic-classifier

use civic_common::api::types::ClassificationResponse;

/// Outcome of one classification request
///
/// Produced once per request and returned immediately; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Winning label
    pub label: String,
    /// Probability (image path) or remote score (text path) of `label`
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl From<ClassificationResult> for ClassificationResponse {
    fn from(result: ClassificationResult) -> Self {
        ClassificationResponse {
            classification: result.label,
            confidence: result.confidence,
        }
    }
}
