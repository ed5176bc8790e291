//! Booking status state machine.
//!
//! Pure status derivation. Two entry points: `initial_status` for booking
//! creation and `next_status` for transitions. The one deliberate override
//! of a caller's request: a booking can never be `approved` without a
//! sitter, so such requests land on `scheduled` instead.

use crate::domain::bookings::BookingStatus;
use crate::error::ApiError;

/// Outcome of a transition: the derived status and whether the approval
/// timestamp should be stamped now (it is only ever stamped once).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDecision {
    pub status: BookingStatus,
    pub set_approved_at: bool,
}

/// Status of a freshly created booking. Auto-approving payment methods skip
/// the manual approval queue; whether they land on `approved` or
/// `scheduled` depends on a sitter being attached already.
pub fn initial_status(has_sitter: bool, payment_auto_approves: bool) -> BookingStatus {
    if payment_auto_approves {
        if has_sitter {
            BookingStatus::Approved
        } else {
            BookingStatus::Scheduled
        }
    } else {
        BookingStatus::Pending
    }
}

/// Derive the status a booking should take given the requested status and
/// whether a sitter is attached.
pub fn next_status(
    current: BookingStatus,
    has_sitter: bool,
    requested: BookingStatus,
    approved_at_set: bool,
) -> Result<StatusDecision, ApiError> {
    // A sitterless booking requesting approval lands on scheduled:
    // "would be approved except no sitter is attached yet".
    let effective = if requested == BookingStatus::Approved && !has_sitter {
        BookingStatus::Scheduled
    } else {
        requested
    };

    if effective != current && !transition_allowed(current, effective) {
        return Err(ApiError::bad_request(format!(
            "cannot move booking from {current} to {effective}"
        )));
    }

    Ok(StatusDecision {
        status: effective,
        set_approved_at: effective == BookingStatus::Approved && !approved_at_set,
    })
}

/// Legal transition table. Terminal statuses never move again, and nothing
/// jumps to `completed` except from `active`.
fn transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    match from {
        Pending => matches!(to, Scheduled | Approved | Cancelled),
        Scheduled => matches!(to, Approved | Cancelled),
        Approved => matches!(to, Active | Cancelled),
        Active => matches!(to, Completed | Cancelled),
        Completed | Cancelled => false,
    }
}
