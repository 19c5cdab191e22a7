//! API types shared between the classifier service and its clients

pub mod types;

pub use types::{ClassificationResponse, ClassifyTextRequest, ErrorResponse};
