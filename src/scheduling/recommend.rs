//! Sitter recommendation scoring.
//!
//! The remote scoring service is the primary path; when a call fails the
//! candidate is scored locally with fixed weights instead. Failures are
//! strictly per candidate, so one unreachable call never blocks the rest of
//! the pool. Recommendations are ephemeral: recomputed on demand, consumed
//! for a single assignment decision, never persisted.

use std::sync::Arc;

use crate::domain::bookings::Booking;
use crate::domain::sitters::{Confidence, Recommendation, SitterCandidate};
use crate::services::scoring_client::{CandidateFeatures, RemoteScorer};

/// Ranked recommendations returned per booking
pub const MAX_RECOMMENDATIONS: usize = 5;

pub struct SitterRecommendationScorer {
    remote: Arc<dyn RemoteScorer>,
}

impl SitterRecommendationScorer {
    pub fn new(remote: Arc<dyn RemoteScorer>) -> Self {
        Self { remote }
    }

    /// Score every candidate for the booking and return the top
    /// recommendations, descending by score.
    pub async fn recommend(
        &self,
        booking: &Booking,
        candidates: &[SitterCandidate],
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let features = candidate_features(booking, candidate);
            let recommendation = match self.remote.score(&features).await {
                Ok(remote) => Recommendation {
                    sitter_id: candidate.id,
                    score: remote.score.clamp(0, 100),
                    confidence: remote.confidence,
                    reasons: remote.reasons,
                },
                Err(e) => {
                    tracing::warn!(
                        sitter_id = %candidate.id,
                        error = %e,
                        "Remote scoring failed; falling back to local scoring"
                    );
                    fallback_score(booking, candidate)
                }
            };
            recommendations.push(recommendation);
        }

        recommendations.sort_by(|a, b| b.score.cmp(&a.score));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }
}

/// Features the remote scorer consumes for one candidate
pub fn candidate_features(booking: &Booking, candidate: &SitterCandidate) -> CandidateFeatures {
    CandidateFeatures {
        sitter_id: candidate.id,
        matched_pet_types: matched_pet_types(booking, candidate),
        total_pet_types: candidate.pet_types.len(),
        has_location_data: candidate.has_location_data,
        is_preferred: candidate.is_preferred,
    }
}

fn matched_pet_types(booking: &Booking, candidate: &SitterCandidate) -> usize {
    booking
        .pet_types
        .iter()
        .filter(|pet| candidate.pet_types.contains(pet))
        .count()
}

/// Local deterministic scoring with fixed weights:
/// rating up to 40, experience up to 30, location 15, active 8,
/// pet-type match up to 10. Clamped to 0-100.
pub fn fallback_score(booking: &Booking, candidate: &SitterCandidate) -> Recommendation {
    let mut score = 0.0_f64;
    let mut reasons = Vec::new();

    let rating_points = (candidate.rating * 8.0).min(40.0);
    score += rating_points;
    if candidate.rating > 0.0 {
        reasons.push(format!("Rated {:.1} of 5", candidate.rating));
    }

    let experience_points = (candidate.total_bookings as f64 * 0.5).min(30.0);
    score += experience_points;
    if candidate.total_bookings > 0 {
        reasons.push(format!("{} completed bookings", candidate.total_bookings));
    }

    if candidate.has_location_data {
        score += 15.0;
        reasons.push("Location data on file".to_string());
    }

    if candidate.is_active {
        score += 8.0;
        reasons.push("Active and available".to_string());
    }

    let required = booking.pet_types.len();
    if required == 0 {
        // Nothing requested, nothing to mismatch
        score += 10.0;
    } else {
        let matched = matched_pet_types(booking, candidate);
        score += matched as f64 / required as f64 * 10.0;
        if matched == required {
            reasons.push("Covers every requested pet type".to_string());
        } else if matched > 0 {
            reasons.push(format!("Covers {matched} of {required} requested pet types"));
        }
    }

    let score = (score.round() as i32).clamp(0, 100);

    Recommendation {
        sitter_id: candidate.id,
        score,
        confidence: Confidence::from_score(score),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::test_support;
    use crate::services::scoring_client::{RemoteScore, ScoringError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use uuid::Uuid;

    /// Remote scorer that fails for chosen sitters and returns a fixed
    /// score for the rest.
    struct ScriptedRemote {
        score: i32,
        failing: HashSet<Uuid>,
    }

    impl ScriptedRemote {
        fn scoring(score: i32) -> Self {
            Self {
                score,
                failing: HashSet::new(),
            }
        }

        fn failing_for(score: i32, failing: impl IntoIterator<Item = Uuid>) -> Self {
            Self {
                score,
                failing: failing.into_iter().collect(),
            }
        }
    }

    #[async_trait]
    impl RemoteScorer for ScriptedRemote {
        async fn score(&self, features: &CandidateFeatures) -> Result<RemoteScore, ScoringError> {
            if self.failing.contains(&features.sitter_id) {
                return Err(ScoringError::Unreachable("connection refused".to_string()));
            }
            Ok(RemoteScore {
                score: self.score,
                reasons: vec!["remote".to_string()],
                confidence: Confidence::from_score(self.score),
            })
        }
    }

    #[test]
    fn perfect_candidate_scores_one_hundred_with_high_confidence() {
        let booking = test_support::booking();
        let candidate = SitterCandidate {
            rating: 5.0,
            total_bookings: 100,
            pet_types: booking.pet_types.clone(),
            ..test_support::candidate(5.0, 100)
        };

        let recommendation = fallback_score(&booking, &candidate);

        assert_eq!(recommendation.score, 100);
        assert_eq!(recommendation.confidence, Confidence::High);
        assert!(!recommendation.reasons.is_empty());
    }

    #[test]
    fn weak_candidate_scores_low_confidence() {
        let booking = test_support::booking();
        let candidate = SitterCandidate {
            is_active: false,
            has_location_data: false,
            pet_types: vec![],
            ..test_support::candidate(2.0, 4)
        };

        let recommendation = fallback_score(&booking, &candidate);

        // 16 rating + 2 experience + 0 + 0 + 0 match
        assert_eq!(recommendation.score, 18);
        assert_eq!(recommendation.confidence, Confidence::Low);
    }

    #[test]
    fn partial_pet_type_match_is_proportional() {
        let mut booking = test_support::booking();
        booking.pet_types = vec!["dog".to_string(), "bird".to_string()];
        let candidate = SitterCandidate {
            is_active: false,
            has_location_data: false,
            pet_types: vec!["dog".to_string()],
            ..test_support::candidate(0.0, 0)
        };

        let recommendation = fallback_score(&booking, &candidate);

        // Only the match contribution applies: 1/2 * 10, rounded
        assert_eq!(recommendation.score, 5);
    }

    #[tokio::test]
    async fn one_remote_failure_does_not_block_the_rest() {
        let booking = test_support::booking();
        let candidates: Vec<SitterCandidate> =
            (0..5).map(|_| test_support::candidate(4.0, 20)).collect();
        let failing = candidates[2].id;

        let scorer = SitterRecommendationScorer::new(Arc::new(ScriptedRemote::failing_for(
            90,
            [failing],
        )));
        let recommendations = scorer.recommend(&booking, &candidates).await;

        assert_eq!(recommendations.len(), 5);
        let remote_scored = recommendations.iter().filter(|r| r.score == 90).count();
        assert_eq!(remote_scored, 4);
        // The failed candidate is still present, scored locally
        assert!(recommendations.iter().any(|r| r.sitter_id == failing));
    }

    #[tokio::test]
    async fn recommendations_are_capped_and_sorted() {
        let booking = test_support::booking();
        let candidates: Vec<SitterCandidate> =
            (0..8).map(|_| test_support::candidate(3.0, 10)).collect();
        // Every remote call fails, so local scores differ only by candidate
        let failing: HashSet<Uuid> = candidates.iter().map(|c| c.id).collect();

        let scorer =
            SitterRecommendationScorer::new(Arc::new(ScriptedRemote::failing_for(0, failing)));
        let recommendations = scorer.recommend(&booking, &candidates).await;

        assert_eq!(recommendations.len(), MAX_RECOMMENDATIONS);
        for pair in recommendations.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn remote_scores_pass_through() {
        let booking = test_support::booking();
        let candidates = vec![test_support::candidate(1.0, 0)];

        let scorer = SitterRecommendationScorer::new(Arc::new(ScriptedRemote::scoring(72)));
        let recommendations = scorer.recommend(&booking, &candidates).await;

        assert_eq!(recommendations[0].score, 72);
        assert_eq!(recommendations[0].confidence, Confidence::Medium);
        assert_eq!(recommendations[0].reasons, vec!["remote".to_string()]);
    }
}
