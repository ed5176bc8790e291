//! Recurring-series consistency propagation.
//!
//! When one member of a series is approved or scheduled, every sibling still
//! sitting in `pending` or `scheduled` is re-derived through the status
//! state machine so the series reflects a single policy. Siblings keep their
//! own sitter state; the trigger's sitter is never forced onto them.
//!
//! Siblings are written one at a time with a pacing delay between writes.
//! The store's per-record triggers fire once per sibling and the write rate
//! stays inside what the store expects, at the cost of latency.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::bookings::{Booking, BookingStatus};
use crate::error::ApiError;
use crate::scheduling::recommend::SitterRecommendationScorer;
use crate::scheduling::status::next_status;
use crate::store::{BookingStore, SitterDirectory};

/// Whether propagation may attach sitters to unstaffed siblings. Passed in
/// explicitly at call time so the decision is reproducible; nothing reads
/// ambient settings mid-operation.
#[derive(Debug, Clone, Copy)]
pub struct AutoAssignmentPolicy {
    pub assign_unstaffed_siblings: bool,
}

impl AutoAssignmentPolicy {
    pub fn enabled() -> Self {
        Self {
            assign_unstaffed_siblings: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            assign_unstaffed_siblings: false,
        }
    }
}

/// One sibling successfully advanced
#[derive(Debug, Clone, Serialize)]
pub struct SiblingUpdate {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    /// Sitter attached by auto-assignment during this propagation, if any
    pub sitter_assigned: Option<Uuid>,
}

/// One sibling that could not be advanced
#[derive(Debug, Clone, Serialize)]
pub struct SiblingFailure {
    pub booking_id: Uuid,
    pub reason: String,
}

/// Full account of a propagation pass. A non-empty `failed` list means the
/// series is not uniformly advanced; callers must not treat it as complete.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesPropagationReport {
    pub updated: Vec<SiblingUpdate>,
    pub failed: Vec<SiblingFailure>,
}

impl SeriesPropagationReport {
    pub fn is_fully_consistent(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct SeriesConsistencyCoordinator {
    /// Delay between consecutive sibling writes
    pacing: Duration,
}

impl SeriesConsistencyCoordinator {
    pub fn new(pacing: Duration) -> Self {
        Self { pacing }
    }

    /// Advance the trigger's siblings. Eligible siblings are those still
    /// `pending` or `scheduled`; each is re-derived with its own sitter
    /// flag, optionally auto-assigned first, and persisted individually.
    pub async fn propagate(
        &self,
        store: &dyn BookingStore,
        directory: &dyn SitterDirectory,
        scorer: &SitterRecommendationScorer,
        trigger: &Booking,
        policy: AutoAssignmentPolicy,
        actor_id: Uuid,
    ) -> Result<SeriesPropagationReport, ApiError> {
        let Some(series_id) = trigger.recurring_series_id else {
            return Ok(SeriesPropagationReport::default());
        };

        let mut siblings = store
            .bookings_in_series(series_id, &[BookingStatus::Pending, BookingStatus::Scheduled])
            .await?;
        siblings.retain(|b| b.id != trigger.id);

        // Fetch the candidate pool up front: a directory outage surfaces
        // before any sibling write, never between two of them.
        let candidates = if policy.assign_unstaffed_siblings
            && siblings.iter().any(|b| b.sitter_id.is_none())
        {
            Some(directory.list_active_sitters().await?)
        } else {
            None
        };

        let mut report = SeriesPropagationReport::default();

        for (index, mut sibling) in siblings.into_iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let mut sitter_assigned = None;
            if let (Some(pool), None) = (&candidates, sibling.sitter_id) {
                if let Some(top) = scorer.recommend(&sibling, pool).await.first() {
                    sibling.sitter_id = Some(top.sitter_id);
                    sitter_assigned = Some(top.sitter_id);
                }
            }

            let decision = match next_status(
                sibling.status,
                sibling.has_sitter(),
                BookingStatus::Approved,
                sibling.approved_at.is_some(),
            ) {
                Ok(decision) => decision,
                Err(e) => {
                    report.failed.push(SiblingFailure {
                        booking_id: sibling.id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            sibling.status = decision.status;
            if decision.set_approved_at {
                sibling.approved_at = Some(Utc::now());
            }
            sibling.last_modified_by = Some(actor_id);
            sibling.modification_reason = Some("recurring series consistency update".to_string());

            match store.update_booking(&sibling).await {
                Ok(()) => report.updated.push(SiblingUpdate {
                    booking_id: sibling.id,
                    status: sibling.status,
                    sitter_assigned,
                }),
                Err(e) => report.failed.push(SiblingFailure {
                    booking_id: sibling.id,
                    reason: e.to_string(),
                }),
            }
        }

        if report.is_fully_consistent() {
            tracing::info!(
                series_id = %series_id,
                updated = report.updated.len(),
                "Series propagation complete"
            );
        } else {
            tracing::warn!(
                series_id = %series_id,
                updated = report.updated.len(),
                failed = report.failed.len(),
                "Series propagation left inconsistent siblings"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::test_support;
    use crate::services::scoring_client::{CandidateFeatures, RemoteScore, ScoringError};
    use crate::store::testing::{MockDirectory, MockStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedRemote(i32);

    #[async_trait]
    impl crate::services::scoring_client::RemoteScorer for FixedRemote {
        async fn score(&self, _: &CandidateFeatures) -> Result<RemoteScore, ScoringError> {
            Ok(RemoteScore {
                score: self.0,
                reasons: vec![],
                confidence: crate::domain::sitters::Confidence::from_score(self.0),
            })
        }
    }

    fn coordinator() -> SeriesConsistencyCoordinator {
        SeriesConsistencyCoordinator::new(Duration::ZERO)
    }

    fn scorer() -> SitterRecommendationScorer {
        SitterRecommendationScorer::new(Arc::new(FixedRemote(85)))
    }

    fn series_member(
        series_id: Uuid,
        visit_number: i32,
        status: BookingStatus,
        sitter_id: Option<Uuid>,
    ) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            recurring_series_id: Some(series_id),
            visit_number: Some(visit_number),
            sitter_id,
            status,
            ..test_support::booking()
        }
    }

    #[tokio::test]
    async fn only_pending_and_scheduled_siblings_advance() {
        let store = MockStore::new();
        let series_id = Uuid::new_v4();
        let sitter = Uuid::new_v4();

        let trigger = series_member(series_id, 1, BookingStatus::Approved, Some(sitter));
        let pending_a = series_member(series_id, 2, BookingStatus::Pending, Some(sitter));
        let pending_b = series_member(series_id, 3, BookingStatus::Pending, None);
        let cancelled_a = series_member(series_id, 4, BookingStatus::Cancelled, None);
        let cancelled_b = series_member(series_id, 5, BookingStatus::Cancelled, None);

        for b in [&trigger, &pending_a, &pending_b, &cancelled_a, &cancelled_b] {
            store.seed_booking(b.clone());
        }

        let report = coordinator()
            .propagate(
                &store,
                &MockDirectory::default(),
                &scorer(),
                &trigger,
                AutoAssignmentPolicy::disabled(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(report.updated.len(), 2);
        assert!(report.is_fully_consistent());

        // Each sibling advanced according to its own sitter state
        assert_eq!(
            store.booking(pending_a.id).unwrap().status,
            BookingStatus::Approved
        );
        assert_eq!(
            store.booking(pending_b.id).unwrap().status,
            BookingStatus::Scheduled
        );
        // Terminal siblings are untouched
        assert_eq!(
            store.booking(cancelled_a.id).unwrap().status,
            BookingStatus::Cancelled
        );
        assert_eq!(
            store.booking(cancelled_b.id).unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn auto_assignment_staffs_unassigned_siblings() {
        let store = MockStore::new();
        let series_id = Uuid::new_v4();
        let top_sitter = test_support::candidate(5.0, 80);

        let trigger = series_member(series_id, 1, BookingStatus::Approved, Some(Uuid::new_v4()));
        let unstaffed = series_member(series_id, 2, BookingStatus::Pending, None);
        store.seed_booking(trigger.clone());
        store.seed_booking(unstaffed.clone());

        let directory = MockDirectory {
            sitters: vec![top_sitter.clone()],
        };

        let report = coordinator()
            .propagate(
                &store,
                &directory,
                &scorer(),
                &trigger,
                AutoAssignmentPolicy::enabled(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].sitter_assigned, Some(top_sitter.id));

        let updated = store.booking(unstaffed.id).unwrap();
        assert_eq!(updated.sitter_id, Some(top_sitter.id));
        assert_eq!(updated.status, BookingStatus::Approved);
    }

    #[tokio::test]
    async fn empty_candidate_pool_leaves_siblings_scheduled() {
        let store = MockStore::new();
        let series_id = Uuid::new_v4();

        let trigger = series_member(series_id, 1, BookingStatus::Approved, Some(Uuid::new_v4()));
        let unstaffed = series_member(series_id, 2, BookingStatus::Pending, None);
        store.seed_booking(trigger.clone());
        store.seed_booking(unstaffed.clone());

        let report = coordinator()
            .propagate(
                &store,
                &MockDirectory::default(),
                &scorer(),
                &trigger,
                AutoAssignmentPolicy::enabled(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].sitter_assigned, None);
        assert_eq!(
            store.booking(unstaffed.id).unwrap().status,
            BookingStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn failed_sibling_writes_are_reported_not_swallowed() {
        let store = MockStore::new();
        let series_id = Uuid::new_v4();

        let trigger = series_member(series_id, 1, BookingStatus::Approved, Some(Uuid::new_v4()));
        let ok_sibling = series_member(series_id, 2, BookingStatus::Pending, None);
        let bad_sibling = series_member(series_id, 3, BookingStatus::Pending, None);
        store.seed_booking(trigger.clone());
        store.seed_booking(ok_sibling.clone());
        store.seed_booking(bad_sibling.clone());
        store
            .fail_update_for
            .lock()
            .unwrap()
            .insert(bad_sibling.id);

        let report = coordinator()
            .propagate(
                &store,
                &MockDirectory::default(),
                &scorer(),
                &trigger,
                AutoAssignmentPolicy::disabled(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert!(!report.is_fully_consistent());
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].booking_id, bad_sibling.id);
    }

    #[tokio::test]
    async fn booking_outside_a_series_is_a_no_op() {
        let store = MockStore::new();
        let trigger = test_support::booking();

        let report = coordinator()
            .propagate(
                &store,
                &MockDirectory::default(),
                &scorer(),
                &trigger,
                AutoAssignmentPolicy::enabled(),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert!(report.updated.is_empty());
        assert!(report.failed.is_empty());
    }
}
