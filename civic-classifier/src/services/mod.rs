//! Classification services behind the HTTP handlers

pub mod image_scorer;
pub mod model_hub;
#[cfg(feature = "onnx")]
pub mod onnx_scorer;
pub mod preprocessing;
pub mod response_normalizer;
pub mod text_classifier_client;

pub use image_scorer::{ImageClassificationError, ImageClassifier, ImageScorer, ScorerError};
pub use model_hub::{ModelHub, ModelHubError};
#[cfg(feature = "onnx")]
pub use onnx_scorer::OnnxImageScorer;
pub use preprocessing::{ImageTensor, PreprocessError};
pub use response_normalizer::{normalize, NormalizeError, ParsedResponse};
pub use text_classifier_client::{TextClassifierClient, TextClassifierError};
