//! Record store collaborator contracts.
//!
//! The scheduling engine talks to the persistent record store, the role
//! verifier, and the sitter directory through these traits so each use case
//! is testable against in-memory fakes. `PgStore` implements all three
//! against PostgreSQL.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::bookings::{Booking, BookingStatus};
use crate::domain::series::RecurringSeries;
use crate::domain::sitters::SitterCandidate;
use crate::error::ApiError;

pub mod postgres;

pub use postgres::PgStore;

/// Create/read/update access to bookings and recurring series.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError>;

    /// Atomic multi-write primitive: the whole slice commits or none of it
    /// does. Callers must respect the store's per-transaction ceiling by
    /// chunking; this method does not chunk.
    async fn insert_bookings(&self, bookings: &[Booking]) -> Result<(), ApiError>;

    async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError>;

    /// Persist the mutable fields of one booking.
    async fn update_booking(&self, booking: &Booking) -> Result<(), ApiError>;

    /// All bookings in a series whose status is in `statuses`, ordered by
    /// visit number.
    async fn bookings_in_series(
        &self,
        series_id: Uuid,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>, ApiError>;

    async fn count_bookings_in_series(&self, series_id: Uuid) -> Result<u64, ApiError>;

    async fn insert_series(&self, series: &RecurringSeries) -> Result<(), ApiError>;

    async fn fetch_series(&self, id: Uuid) -> Result<Option<RecurringSeries>, ApiError>;

    async fn update_series_counters(
        &self,
        series_id: Uuid,
        completed_visits: i32,
        canceled_visits: i32,
        upcoming_visits: i32,
    ) -> Result<(), ApiError>;
}

/// Role verification against the identity/profile records.
#[async_trait]
pub trait RoleVerifier: Send + Sync {
    /// Ok when the actor holds an administrative role; `Forbidden` otherwise.
    async fn verify_admin_role(&self, actor_id: Uuid) -> Result<(), ApiError>;
}

/// The external user directory of sitter candidates.
#[async_trait]
pub trait SitterDirectory: Send + Sync {
    async fn list_active_sitters(&self) -> Result<Vec<SitterCandidate>, ApiError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory fakes for the collaborator traits.

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MockStore {
        pub bookings: Mutex<HashMap<Uuid, Booking>>,
        pub series: Mutex<HashMap<Uuid, RecurringSeries>>,
        /// Number of `insert_bookings` chunk calls observed
        pub insert_chunk_calls: AtomicUsize,
        /// Fail the Nth (0-based) `insert_bookings` call
        pub fail_chunk_index: Option<usize>,
        /// Booking ids whose `update_booking` should fail
        pub fail_update_for: Mutex<HashSet<Uuid>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_failing_chunk(index: usize) -> Self {
            Self {
                fail_chunk_index: Some(index),
                ..Self::default()
            }
        }

        pub fn seed_booking(&self, booking: Booking) {
            self.bookings
                .lock()
                .unwrap()
                .insert(booking.id, booking);
        }

        pub fn booking(&self, id: Uuid) -> Option<Booking> {
            self.bookings.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl BookingStore for MockStore {
        async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError> {
            self.seed_booking(booking.clone());
            Ok(())
        }

        async fn insert_bookings(&self, bookings: &[Booking]) -> Result<(), ApiError> {
            let call = self.insert_chunk_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_chunk_index == Some(call) {
                return Err(ApiError::internal("injected chunk failure"));
            }
            let mut map = self.bookings.lock().unwrap();
            for b in bookings {
                map.insert(b.id, b.clone());
            }
            Ok(())
        }

        async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError> {
            Ok(self.booking(id))
        }

        async fn update_booking(&self, booking: &Booking) -> Result<(), ApiError> {
            if self.fail_update_for.lock().unwrap().contains(&booking.id) {
                return Err(ApiError::internal("injected update failure"));
            }
            let mut map = self.bookings.lock().unwrap();
            if !map.contains_key(&booking.id) {
                return Err(ApiError::not_found(format!("booking {}", booking.id)));
            }
            map.insert(booking.id, booking.clone());
            Ok(())
        }

        async fn bookings_in_series(
            &self,
            series_id: Uuid,
            statuses: &[BookingStatus],
        ) -> Result<Vec<Booking>, ApiError> {
            let mut rows: Vec<Booking> = self
                .bookings
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.recurring_series_id == Some(series_id))
                .filter(|b| statuses.contains(&b.status))
                .cloned()
                .collect();
            rows.sort_by_key(|b| b.visit_number);
            Ok(rows)
        }

        async fn count_bookings_in_series(&self, series_id: Uuid) -> Result<u64, ApiError> {
            Ok(self
                .bookings
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.recurring_series_id == Some(series_id))
                .count() as u64)
        }

        async fn insert_series(&self, series: &RecurringSeries) -> Result<(), ApiError> {
            self.series
                .lock()
                .unwrap()
                .insert(series.id, series.clone());
            Ok(())
        }

        async fn fetch_series(&self, id: Uuid) -> Result<Option<RecurringSeries>, ApiError> {
            Ok(self.series.lock().unwrap().get(&id).cloned())
        }

        async fn update_series_counters(
            &self,
            series_id: Uuid,
            completed_visits: i32,
            canceled_visits: i32,
            upcoming_visits: i32,
        ) -> Result<(), ApiError> {
            let mut map = self.series.lock().unwrap();
            let series = map
                .get_mut(&series_id)
                .ok_or_else(|| ApiError::not_found(format!("series {series_id}")))?;
            series.completed_visits = completed_visits;
            series.canceled_visits = canceled_visits;
            series.upcoming_visits = upcoming_visits;
            Ok(())
        }
    }

    pub struct MockRoles {
        pub admins: HashSet<Uuid>,
    }

    impl MockRoles {
        pub fn admin(actor_id: Uuid) -> Self {
            Self {
                admins: HashSet::from([actor_id]),
            }
        }
    }

    #[async_trait]
    impl RoleVerifier for MockRoles {
        async fn verify_admin_role(&self, actor_id: Uuid) -> Result<(), ApiError> {
            if self.admins.contains(&actor_id) {
                Ok(())
            } else {
                Err(ApiError::forbidden("Administrative role required"))
            }
        }
    }

    #[derive(Default)]
    pub struct MockDirectory {
        pub sitters: Vec<SitterCandidate>,
    }

    #[async_trait]
    impl SitterDirectory for MockDirectory {
        async fn list_active_sitters(&self) -> Result<Vec<SitterCandidate>, ApiError> {
            Ok(self.sitters.clone())
        }
    }
}
