//! Domain types and DTOs
//!
//! Data structures for the booking lifecycle and recurring-scheduling engine:
//! bookings, recurring series, and sitter recommendation types.

#![allow(dead_code)]

pub mod bookings;
pub mod series;
pub mod sitters;

pub use bookings::*;
pub use series::*;
pub use sitters::*;
