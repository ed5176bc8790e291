//! Recurring series domain types
//!
//! A recurring series is the template that produced a batch of bookings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bookings::PaymentMethod;

// ============================================================================
// Frequency
// ============================================================================

/// Recurrence frequency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Recurring-commitment discount applied to the series total.
    /// Denser schedules earn a larger discount.
    pub fn discount(&self) -> Decimal {
        match self {
            Frequency::Daily => Decimal::new(15, 2),   // 15%
            Frequency::Weekly => Decimal::new(10, 2),  // 10%
            Frequency::Monthly => Decimal::new(5, 2),  // 5%
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Series total: base price for every visit, less the frequency discount.
pub fn series_total_price(
    base_price: Decimal,
    number_of_visits: u32,
    frequency: Frequency,
) -> Decimal {
    base_price * Decimal::from(number_of_visits) * (Decimal::ONE - frequency.discount())
}

// ============================================================================
// Day Schedule
// ============================================================================

/// Per-weekday visit configuration, used only for weekly recurrence.
/// `day_of_week` is 0-based with 0 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day_of_week: u8,
    pub enabled: bool,
    /// 1 or 2 visits on this weekday
    pub number_of_visits: u8,
    /// Wall-clock "HH:MM" strings, one per visit, in order
    pub visit_times: Vec<String>,
}

// ============================================================================
// Recurring Series
// ============================================================================

/// The persisted series template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_type: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Target visit count; the number of persisted bookings must match it
    pub number_of_visits: i32,
    pub base_price: Decimal,
    pub total_price: Decimal,
    /// Wall-clock "HH:MM" base time for generated visits
    pub preferred_time: String,
    /// Weekday ordinals (weekly) or days of month (monthly); empty when unused
    pub preferred_days: Vec<u8>,
    pub day_schedules: Option<Vec<DaySchedule>>,
    pub completed_visits: i32,
    pub canceled_visits: i32,
    pub upcoming_visits: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Inputs
// ============================================================================

/// Create recurring series input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSeriesInput {
    pub client_id: Uuid,
    pub service_type: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub number_of_visits: u32,
    pub base_price: Decimal,
    /// Wall-clock "HH:MM" base time for generated visits
    pub preferred_time: String,
    pub preferred_days: Option<Vec<u8>>,
    pub day_schedules: Option<Vec<DaySchedule>>,
    /// Visits per unique day in index mode; defaults to 1
    pub visits_per_day: Option<u32>,
    /// Minutes between same-day visits in index mode; defaults to 60
    pub time_interval_minutes: Option<u32>,
    pub duration_minutes: i32,
    pub pet_types: Option<Vec<String>>,
    pub payment_method: PaymentMethod,
    pub time_zone: Option<String>,
    /// Pre-chosen sitter applied to every generated booking
    pub sitter_id: Option<Uuid>,
}

/// Bulk sitter assignment input for a whole series
#[derive(Debug, Clone, Deserialize)]
pub struct BulkAssignInput {
    pub sitter_id: Uuid,
}
