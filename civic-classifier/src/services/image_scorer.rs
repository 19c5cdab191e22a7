//! Issue photo classification
//!
//! The model itself is opaque: an [`ImageScorer`] turns a preprocessed
//! tensor into one raw score per candidate label. This module owns the
//! part around it: preprocessing, softmax and picking the winning label.

use civic_common::IssueCategory;
use std::sync::Arc;
use thiserror::Error;

use crate::services::preprocessing::{self, ImageTensor, PreprocessError};
use crate::types::ClassificationResult;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}

/// Failure anywhere between uploaded bytes and a classification
#[derive(Debug, Error)]
pub enum ImageClassificationError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Scorer(#[from] ScorerError),
}

/// Preloaded classification model
///
/// Loaded once at startup and shared read-only between requests.
pub trait ImageScorer: Send + Sync {
    /// Raw (pre-softmax) scores, one per `IssueCategory::ALL` entry
    fn logits(&self, input: &ImageTensor) -> Result<Vec<f32>, ScorerError>;

    /// Human-readable model identification for logs and `/health`
    fn describe(&self) -> String;
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax then argmax over the candidate labels
///
/// The first maximum wins on ties.
pub fn classify_logits(logits: &[f32]) -> Result<ClassificationResult, ScorerError> {
    if logits.len() != IssueCategory::ALL.len() {
        return Err(ScorerError::OutputShape {
            expected: IssueCategory::ALL.len(),
            actual: logits.len(),
        });
    }

    let probabilities = softmax(logits);
    let (index, confidence) = probabilities.iter().copied().enumerate().fold(
        (0, f32::NEG_INFINITY),
        |best, (i, p)| if p > best.1 { (i, p) } else { best },
    );
    if !confidence.is_finite() {
        return Err(ScorerError::Inference(format!(
            "model returned non-finite scores: {:?}",
            logits
        )));
    }

    let category = IssueCategory::from_index(index).ok_or(ScorerError::OutputShape {
        expected: IssueCategory::ALL.len(),
        actual: logits.len(),
    })?;

    Ok(ClassificationResult::new(category.as_str(), confidence as f64))
}

/// Scorer plus the preprocessing it expects
pub struct ImageClassifier {
    scorer: Arc<dyn ImageScorer>,
    input_size: u32,
}

impl ImageClassifier {
    pub fn new(scorer: Arc<dyn ImageScorer>, input_size: u32) -> Self {
        Self { scorer, input_size }
    }

    /// Square side length images are resized to
    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn describe(&self) -> String {
        self.scorer.describe()
    }

    /// Classify uploaded image bytes
    ///
    /// CPU-bound; call from a blocking context.
    pub fn classify(&self, bytes: &[u8]) -> Result<ClassificationResult, ImageClassificationError> {
        let tensor = preprocessing::preprocess(bytes, self.input_size)?;
        let logits = self.scorer.logits(&tensor)?;
        Ok(classify_logits(&logits)?)
    }
}
