//! Service layer modules for external integrations.
//!
//! Contains the client for the remote sitter-scoring service.

pub mod scoring_client;

pub use scoring_client::{RemoteScorer, ScoringClient};
