//! Booking domain types
//!
//! A booking is one scheduled service visit. Bookings created from a
//! recurring series carry the series id and their 1-based position in it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Booking Status
// ============================================================================

/// Booking lifecycle status
///
/// `Scheduled` means "would be approved except no sitter is attached yet".
/// A booking is never `Approved` without a sitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Scheduled,
    Approved,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Scheduled => write!(f, "scheduled"),
            BookingStatus::Approved => write!(f, "approved"),
            BookingStatus::Active => write!(f, "active"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "scheduled" => Ok(BookingStatus::Scheduled),
            "approved" => Ok(BookingStatus::Approved),
            "active" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment method for a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    Comp,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    /// Offline methods bypass manual admin approval of the booking
    pub fn auto_approves(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash | PaymentMethod::Check | PaymentMethod::Comp
        )
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Check => write!(f, "check"),
            PaymentMethod::Comp => write!(f, "comp"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "check" => Ok(PaymentMethod::Check),
            "comp" => Ok(PaymentMethod::Comp),
            "card" => Ok(PaymentMethod::Card),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Payment collection status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

// ============================================================================
// Booking
// ============================================================================

/// One scheduled service visit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub recurring_series_id: Option<Uuid>,
    /// 1-based position within the series, if any
    pub visit_number: Option<i32>,
    pub client_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    /// IANA zone identifier of the originating request. Informational only;
    /// `scheduled_at` is the absolute instant.
    pub time_zone: String,
    pub duration_minutes: i32,
    pub pet_types: Vec<String>,
    pub price: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_by_role: String,
    pub last_modified_by: Option<Uuid>,
    pub modification_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn has_sitter(&self) -> bool {
        self.sitter_id.is_some()
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Create single booking input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingInput {
    pub client_id: Uuid,
    pub sitter_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub time_zone: Option<String>,
    pub duration_minutes: i32,
    pub pet_types: Option<Vec<String>>,
    pub price: Decimal,
    pub payment_method: PaymentMethod,
}

/// Update booking status input
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatusInput {
    pub status: BookingStatus,
    pub reason: Option<String>,
    /// Per-request override of the auto-assignment policy applied during
    /// series propagation. Defaults to the configured engine policy.
    pub auto_assign_siblings: Option<bool>,
}

/// Assign sitter input
#[derive(Debug, Clone, Deserialize)]
pub struct AssignSitterInput {
    pub sitter_id: Uuid,
}

/// Unassign sitter input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnassignSitterInput {
    pub reason: Option<String>,
}

/// Booking list filter query
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingQuery {
    pub status: Option<String>,
    pub client_id: Option<Uuid>,
    pub sitter_id: Option<Uuid>,
    pub recurring_series_id: Option<Uuid>,
}
