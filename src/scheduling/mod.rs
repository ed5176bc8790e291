//! Booking lifecycle and recurring-scheduling engine.
//!
//! Request-scoped and stateless: all durable state lives in the record
//! store, reached through the `store` traits. Consistency comes from the
//! status state machine plus explicit verification, not from one database
//! transaction per use case.

pub mod batch;
pub mod orchestrator;
pub mod recommend;
pub mod recurrence;
pub mod series;
pub mod status;

pub use batch::BatchWriteCoordinator;
pub use orchestrator::AdminBookingOrchestrator;
pub use recommend::SitterRecommendationScorer;
pub use recurrence::RecurrenceRule;
pub use series::{AutoAssignmentPolicy, SeriesConsistencyCoordinator};

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared builders for engine tests.

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::domain::bookings::{Booking, BookingStatus, PaymentMethod, PaymentStatus};
    use crate::domain::sitters::SitterCandidate;

    pub fn booking() -> Booking {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Booking {
            id: Uuid::new_v4(),
            recurring_series_id: None,
            visit_number: None,
            client_id: Uuid::new_v4(),
            sitter_id: None,
            scheduled_at: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
            time_zone: "America/Chicago".to_string(),
            duration_minutes: 60,
            pet_types: vec!["dog".to_string()],
            price: Decimal::new(5000, 2),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            status: BookingStatus::Pending,
            approved_at: None,
            created_by: Uuid::new_v4(),
            created_by_role: "admin".to_string(),
            last_modified_by: None,
            modification_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn candidate(rating: f64, total_bookings: i32) -> SitterCandidate {
        SitterCandidate {
            id: Uuid::new_v4(),
            rating,
            total_bookings,
            is_active: true,
            has_location_data: true,
            is_preferred: false,
            pet_types: vec!["dog".to_string(), "cat".to_string()],
        }
    }
}
