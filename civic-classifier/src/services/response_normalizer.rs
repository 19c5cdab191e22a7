//! Zero-shot response normalizer
//!
//! The hosted inference API answers in one of three JSON shapes depending
//! on model and API version:
//!
//! - Aggregate: `{"labels": [...], "scores": [...]}` (parallel arrays)
//! - Scalar pair: `{"label": "...", "score": 0.9}`
//! - Ranked list: `[{"label": "...", "score": 0.9}, ...]` (any order)
//!
//! Each shape is tried in that priority order and the first match is
//! reduced to a single `(label, score)` pair.

use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

use crate::types::ClassificationResult;

/// Response matched none of the known shapes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unrecognized text classifier response shape")]
    UnrecognizedShape,
}

#[derive(Debug, Deserialize)]
struct AggregateShape {
    labels: Vec<String>,
    scores: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ScalarPairShape {
    label: String,
    score: f64,
}

/// One element of a ranked-list response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl RankedEntry {
    /// Sort key; a missing score ranks as zero
    fn sort_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Decoded remote classifier response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// Parallel arrays, both non-empty
    Aggregate { labels: Vec<String>, scores: Vec<f64> },
    /// Single label/score object
    ScalarPair { label: String, score: f64 },
    /// Non-empty list of label/score objects
    RankedList(Vec<RankedEntry>),
    Unrecognized,
}

impl ParsedResponse {
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::Object(_) => {
                if let Ok(aggregate) = AggregateShape::deserialize(value) {
                    if !aggregate.labels.is_empty() && !aggregate.scores.is_empty() {
                        return ParsedResponse::Aggregate {
                            labels: aggregate.labels,
                            scores: aggregate.scores,
                        };
                    }
                }
                match ScalarPairShape::deserialize(value) {
                    Ok(pair) => ParsedResponse::ScalarPair {
                        label: pair.label,
                        score: pair.score,
                    },
                    Err(_) => ParsedResponse::Unrecognized,
                }
            }
            Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => {
                match Vec::<RankedEntry>::deserialize(value) {
                    Ok(entries) => ParsedResponse::RankedList(entries),
                    Err(_) => ParsedResponse::Unrecognized,
                }
            }
            _ => ParsedResponse::Unrecognized,
        }
    }

    /// Reduce to the winning label and score
    ///
    /// Aggregate responses are taken as already ranked: the first pair wins
    /// even when a later score is higher. Ranked lists are stable-sorted by
    /// score descending, so the earliest of equal top scores wins.
    pub fn best(self) -> Result<ClassificationResult, NormalizeError> {
        match self {
            ParsedResponse::Aggregate { labels, scores } => {
                match (labels.into_iter().next(), scores.first()) {
                    (Some(label), Some(&score)) => Ok(ClassificationResult::new(label, score)),
                    _ => Err(NormalizeError::UnrecognizedShape),
                }
            }
            ParsedResponse::ScalarPair { label, score } => {
                Ok(ClassificationResult::new(label, score))
            }
            ParsedResponse::RankedList(mut entries) => {
                entries.sort_by(|a, b| {
                    b.sort_score()
                        .partial_cmp(&a.sort_score())
                        .unwrap_or(Ordering::Equal)
                });
                match entries.into_iter().next() {
                    Some(RankedEntry {
                        label: Some(label),
                        score: Some(score),
                    }) => Ok(ClassificationResult::new(label, score)),
                    _ => Err(NormalizeError::UnrecognizedShape),
                }
            }
            ParsedResponse::Unrecognized => Err(NormalizeError::UnrecognizedShape),
        }
    }
}

/// Reduce a raw remote classifier response to its best `(label, score)`
pub fn normalize(value: &Value) -> Result<ClassificationResult, NormalizeError> {
    ParsedResponse::parse(value).best()
}
