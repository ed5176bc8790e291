//! Sitter candidate and recommendation types
//!
//! Candidates come from the external user directory; recommendations are
//! ephemeral scoring output, recomputed on demand and never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sitter eligible for assignment, as reported by the user directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitterCandidate {
    pub id: Uuid,
    /// 0-5 star rating
    pub rating: f64,
    pub total_bookings: i32,
    pub is_active: bool,
    pub has_location_data: bool,
    pub is_preferred: bool,
    pub pet_types: Vec<String>,
}

/// Coarse confidence bucket derived from a recommendation's numeric score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: i32) -> Self {
        if score >= 80 {
            Confidence::High
        } else if score >= 60 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// A ranked sitter recommendation for one booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub sitter_id: Uuid,
    /// Integer 0-100
    pub score: i32,
    pub confidence: Confidence,
    /// Ordered human-readable justifications
    pub reasons: Vec<String>,
}
