pub mod bookings;
pub mod health;
pub mod series;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:booking_id", get(bookings::get_booking))
        .route(
            "/bookings/:booking_id/status",
            patch(bookings::update_booking_status),
        )
        .route(
            "/bookings/:booking_id/sitter",
            post(bookings::assign_sitter),
        )
        .route(
            "/bookings/:booking_id/sitter",
            delete(bookings::unassign_sitter),
        )
        .route(
            "/bookings/:booking_id/recommendations",
            get(bookings::list_recommendations),
        )
        // Recurring series
        .route("/recurring-series", post(series::create_series))
        .route("/recurring-series/:series_id", get(series::get_series))
        .route(
            "/recurring-series/:series_id/assign",
            post(series::bulk_assign_series),
        )
}
