//! Client for the remote sitter-scoring service.
//!
//! The scoring service receives per-candidate features and returns a scored,
//! explained recommendation. Calls fail independently per candidate; the
//! caller decides whether to fall back to local scoring.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::sitters::Confidence;

/// Per-candidate features sent to the scoring service
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFeatures {
    pub sitter_id: Uuid,
    /// Pet types shared between the booking and the candidate
    pub matched_pet_types: usize,
    /// Total pet types the candidate covers
    pub total_pet_types: usize,
    pub has_location_data: bool,
    pub is_preferred: bool,
}

/// Scored response for one candidate
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteScore {
    /// Integer 0-100
    pub score: i32,
    pub reasons: Vec<String>,
    pub confidence: Confidence,
}

/// A single scoring call failing. Never fatal on its own: the recommendation
/// scorer falls back to local scoring per candidate.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring service unreachable: {0}")]
    Unreachable(String),

    #[error("scoring service returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid scoring response: {0}")]
    InvalidResponse(String),
}

/// Remote scoring contract, mockable for tests
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    async fn score(&self, features: &CandidateFeatures) -> Result<RemoteScore, ScoringError>;
}

/// Error body returned by the scoring service
#[derive(Debug, Deserialize)]
struct ScoringErrorResponse {
    message: String,
}

/// HTTP client for the scoring service
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ScoringClient {
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Scoring client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Check scoring service health.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Scoring service health check failed")?
            .error_for_status()
            .context("Scoring service unhealthy")?;

        Ok(())
    }
}

#[async_trait]
impl RemoteScorer for ScoringClient {
    async fn score(&self, features: &CandidateFeatures) -> Result<RemoteScore, ScoringError> {
        let url = format!("{}/v1/score", self.base_url);

        debug!(url = %url, sitter_id = %features.sitter_id, "Scoring service request");

        let response = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json")
            .json(features)
            .send()
            .await
            .map_err(|e| ScoringError::Unreachable(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            response
                .json::<RemoteScore>()
                .await
                .map_err(|e| ScoringError::InvalidResponse(e.to_string()))
        } else {
            let message = response
                .json::<ScoringErrorResponse>()
                .await
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("scoring service error: {status}"));

            Err(ScoringError::Status { status, message })
        }
    }
}
