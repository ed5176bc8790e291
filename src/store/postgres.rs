//! PostgreSQL implementation of the store contracts

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::bookings::{Booking, BookingStatus, PaymentMethod, PaymentStatus};
use crate::domain::series::{DaySchedule, Frequency, RecurringSeries};
use crate::domain::sitters::SitterCandidate;
use crate::error::ApiError;

use super::{BookingStore, RoleVerifier, SitterDirectory};

/// Store backed by the PostgreSQL record database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub recurring_series_id: Option<Uuid>,
    pub visit_number: Option<i32>,
    pub client_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub time_zone: String,
    pub duration_minutes: i32,
    pub pet_types: serde_json::Value,
    pub price: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_by_role: String,
    pub last_modified_by: Option<Uuid>,
    pub modification_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = ApiError;

    fn try_from(r: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_str(&r.status).map_err(ApiError::internal)?;
        let payment_method =
            PaymentMethod::from_str(&r.payment_method).map_err(ApiError::internal)?;
        let payment_status =
            PaymentStatus::from_str(&r.payment_status).map_err(ApiError::internal)?;
        let pet_types: Vec<String> = serde_json::from_value(r.pet_types).unwrap_or_default();

        Ok(Booking {
            id: r.id,
            recurring_series_id: r.recurring_series_id,
            visit_number: r.visit_number,
            client_id: r.client_id,
            sitter_id: r.sitter_id,
            scheduled_at: r.scheduled_at,
            time_zone: r.time_zone,
            duration_minutes: r.duration_minutes,
            pet_types,
            price: r.price,
            payment_method,
            payment_status,
            status,
            approved_at: r.approved_at,
            created_by: r.created_by,
            created_by_role: r.created_by_role,
            last_modified_by: r.last_modified_by,
            modification_reason: r.modification_reason,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SeriesRow {
    id: Uuid,
    client_id: Uuid,
    service_type: String,
    frequency: String,
    start_date: NaiveDate,
    number_of_visits: i32,
    base_price: Decimal,
    total_price: Decimal,
    preferred_time: String,
    preferred_days: serde_json::Value,
    day_schedules: Option<serde_json::Value>,
    completed_visits: i32,
    canceled_visits: i32,
    upcoming_visits: i32,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeriesRow> for RecurringSeries {
    type Error = ApiError;

    fn try_from(r: SeriesRow) -> Result<Self, Self::Error> {
        let frequency = Frequency::from_str(&r.frequency).map_err(ApiError::internal)?;
        let preferred_days: Vec<u8> = serde_json::from_value(r.preferred_days).unwrap_or_default();
        let day_schedules: Option<Vec<DaySchedule>> = r
            .day_schedules
            .and_then(|v| serde_json::from_value(v).ok());

        Ok(RecurringSeries {
            id: r.id,
            client_id: r.client_id,
            service_type: r.service_type,
            frequency,
            start_date: r.start_date,
            number_of_visits: r.number_of_visits,
            base_price: r.base_price,
            total_price: r.total_price,
            preferred_time: r.preferred_time,
            preferred_days,
            day_schedules,
            completed_visits: r.completed_visits,
            canceled_visits: r.canceled_visits,
            upcoming_visits: r.upcoming_visits,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SitterRow {
    id: Uuid,
    rating: Decimal,
    total_bookings: i32,
    is_active: bool,
    has_location_data: bool,
    is_preferred: bool,
    pet_types: serde_json::Value,
}

pub(crate) fn decimal_to_f64(d: Decimal) -> f64 {
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

pub(crate) const BOOKING_COLUMNS: &str = "id, recurring_series_id, visit_number, client_id, sitter_id, \
     scheduled_at, time_zone, duration_minutes, pet_types, price, payment_method, \
     payment_status, status, approved_at, created_by, created_by_role, \
     last_modified_by, modification_reason, created_at, updated_at";

async fn insert_booking_with<'e, E>(executor: E, b: &Booking) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let pet_types = serde_json::to_value(&b.pet_types).unwrap_or(serde_json::json!([]));

    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, recurring_series_id, visit_number, client_id, sitter_id,
            scheduled_at, time_zone, duration_minutes, pet_types, price,
            payment_method, payment_status, status, approved_at,
            created_by, created_by_role, last_modified_by, modification_reason,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        "#,
    )
    .bind(b.id)
    .bind(b.recurring_series_id)
    .bind(b.visit_number)
    .bind(b.client_id)
    .bind(b.sitter_id)
    .bind(b.scheduled_at)
    .bind(&b.time_zone)
    .bind(b.duration_minutes)
    .bind(&pet_types)
    .bind(b.price)
    .bind(b.payment_method.to_string())
    .bind(b.payment_status.to_string())
    .bind(b.status.to_string())
    .bind(b.approved_at)
    .bind(b.created_by)
    .bind(&b.created_by_role)
    .bind(b.last_modified_by)
    .bind(&b.modification_reason)
    .bind(b.created_at)
    .bind(b.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

// ============================================================================
// BookingStore
// ============================================================================

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), ApiError> {
        insert_booking_with(&self.pool, booking).await?;
        Ok(())
    }

    async fn insert_bookings(&self, bookings: &[Booking]) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        for booking in bookings {
            insert_booking_with(&mut *tx, booking).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_booking(&self, id: Uuid) -> Result<Option<Booking>, ApiError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_booking(&self, booking: &Booking) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                sitter_id = $1,
                scheduled_at = $2,
                status = $3,
                approved_at = $4,
                payment_status = $5,
                last_modified_by = $6,
                modification_reason = $7,
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(booking.sitter_id)
        .bind(booking.scheduled_at)
        .bind(booking.status.to_string())
        .bind(booking.approved_at)
        .bind(booking.payment_status.to_string())
        .bind(booking.last_modified_by)
        .bind(&booking.modification_reason)
        .bind(booking.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("booking {}", booking.id)));
        }

        Ok(())
    }

    async fn bookings_in_series(
        &self,
        series_id: Uuid,
        statuses: &[BookingStatus],
    ) -> Result<Vec<Booking>, ApiError> {
        let status_strings: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE recurring_series_id = $1 AND status = ANY($2)
            ORDER BY visit_number
            "#
        ))
        .bind(series_id)
        .bind(&status_strings)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn count_bookings_in_series(&self, series_id: Uuid) -> Result<u64, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE recurring_series_id = $1")
                .bind(series_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn insert_series(&self, series: &RecurringSeries) -> Result<(), ApiError> {
        let preferred_days =
            serde_json::to_value(&series.preferred_days).unwrap_or(serde_json::json!([]));
        let day_schedules = series
            .day_schedules
            .as_ref()
            .map(|d| serde_json::to_value(d).unwrap_or(serde_json::json!([])));

        sqlx::query(
            r#"
            INSERT INTO recurring_series (
                id, client_id, service_type, frequency, start_date,
                number_of_visits, base_price, total_price, preferred_time,
                preferred_days, day_schedules, completed_visits, canceled_visits,
                upcoming_visits, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(series.id)
        .bind(series.client_id)
        .bind(&series.service_type)
        .bind(series.frequency.to_string())
        .bind(series.start_date)
        .bind(series.number_of_visits)
        .bind(series.base_price)
        .bind(series.total_price)
        .bind(&series.preferred_time)
        .bind(&preferred_days)
        .bind(day_schedules)
        .bind(series.completed_visits)
        .bind(series.canceled_visits)
        .bind(series.upcoming_visits)
        .bind(series.created_by)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_series(&self, id: Uuid) -> Result<Option<RecurringSeries>, ApiError> {
        let row = sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, client_id, service_type, frequency, start_date,
                   number_of_visits, base_price, total_price, preferred_time,
                   preferred_days, day_schedules, completed_visits, canceled_visits,
                   upcoming_visits, created_by, created_at, updated_at
            FROM recurring_series
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecurringSeries::try_from).transpose()
    }

    async fn update_series_counters(
        &self,
        series_id: Uuid,
        completed_visits: i32,
        canceled_visits: i32,
        upcoming_visits: i32,
    ) -> Result<(), ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE recurring_series SET
                completed_visits = $1,
                canceled_visits = $2,
                upcoming_visits = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(completed_visits)
        .bind(canceled_visits)
        .bind(upcoming_visits)
        .bind(series_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("series {series_id}")));
        }

        Ok(())
    }
}

// ============================================================================
// RoleVerifier
// ============================================================================

#[async_trait]
impl RoleVerifier for PgStore {
    async fn verify_admin_role(&self, actor_id: Uuid) -> Result<(), ApiError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM profiles WHERE id = $1")
                .bind(actor_id)
                .fetch_optional(&self.pool)
                .await?;

        if is_admin != Some(true) {
            tracing::warn!(actor_id = %actor_id, "Non-admin actor attempted a booking mutation");
            return Err(ApiError::forbidden("Administrative role required"));
        }

        Ok(())
    }
}

// ============================================================================
// SitterDirectory
// ============================================================================

#[async_trait]
impl SitterDirectory for PgStore {
    async fn list_active_sitters(&self) -> Result<Vec<SitterCandidate>, ApiError> {
        let rows = sqlx::query_as::<_, SitterRow>(
            r#"
            SELECT id, rating, total_bookings, is_active, has_location_data,
                   is_preferred, pet_types
            FROM sitters
            WHERE is_active = TRUE
            ORDER BY rating DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SitterCandidate {
                id: r.id,
                rating: decimal_to_f64(r.rating),
                total_bookings: r.total_bookings,
                is_active: r.is_active,
                has_location_data: r.has_location_data,
                is_preferred: r.is_preferred,
                pet_types: serde_json::from_value(r.pet_types).unwrap_or_default(),
            })
            .collect())
    }
}
