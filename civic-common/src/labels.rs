//! Candidate label set shared by the image and text classification paths
//!
//! The order is significant: index `i` of the image model's output
//! corresponds to `IssueCategory::ALL[i]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-shot `candidate_labels` payload, in model output order
pub const CANDIDATE_LABELS: [&str; 4] = ["Drainage", "Road_Damage", "Street_Light", "Trash"];

/// Category of a reported civic issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    Drainage,
    #[serde(rename = "Road_Damage")]
    RoadDamage,
    #[serde(rename = "Street_Light")]
    StreetLight,
    Trash,
}

impl IssueCategory {
    /// All categories in model output order
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Drainage,
        IssueCategory::RoadDamage,
        IssueCategory::StreetLight,
        IssueCategory::Trash,
    ];

    /// Wire label (matches `CANDIDATE_LABELS`)
    pub fn as_str(&self) -> &'static str {
        CANDIDATE_LABELS[self.index()]
    }

    /// Position in the model output vector
    pub fn index(&self) -> usize {
        match self {
            IssueCategory::Drainage => 0,
            IssueCategory::RoadDamage => 1,
            IssueCategory::StreetLight => 2,
            IssueCategory::Trash => 3,
        }
    }

    /// Category for a model output index, `None` when out of range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
