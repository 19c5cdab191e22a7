//! # Civic Common Library
//!
//! Shared code for the civic-issue classification service including:
//! - The fixed candidate label set
//! - API request/response types
//! - Configuration loading
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod labels;

pub use error::{Error, Result};
pub use labels::{IssueCategory, CANDIDATE_LABELS};
