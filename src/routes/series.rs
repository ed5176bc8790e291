//! Recurring series routes
//!
//! Endpoints for creating a recurring series, inspecting it together with
//! its generated bookings, and assigning a sitter across the whole series.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::bookings::{Booking, BookingStatus};
use crate::domain::series::{BulkAssignInput, CreateSeriesInput, RecurringSeries};
use crate::error::ApiError;
use crate::store::BookingStore;

#[derive(Debug, Serialize)]
pub struct SeriesWithBookings {
    pub series: RecurringSeries,
    pub bookings: Vec<Booking>,
}

/// POST /recurring-series
pub async fn create_series(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<CreateSeriesInput>,
) -> Result<impl IntoResponse, ApiError> {
    let creation = state
        .orchestrator
        .create_recurring_series(auth.user_id, input)
        .await?;

    Ok(Created(DataResponse::new(creation)))
}

/// GET /recurring-series/:series_id
///
/// The series template plus every booking it generated.
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    use BookingStatus::*;

    let series = state
        .store
        .fetch_series(series_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Series not found"))?;

    let bookings = state
        .store
        .bookings_in_series(
            series_id,
            &[Pending, Scheduled, Approved, Active, Completed, Cancelled],
        )
        .await?;

    Ok(Json(DataResponse::new(SeriesWithBookings {
        series,
        bookings,
    })))
}

/// POST /recurring-series/:series_id/assign
pub async fn bulk_assign_series(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<BulkAssignInput>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .orchestrator
        .bulk_assign_series(auth.user_id, series_id, input)
        .await?;

    Ok(Json(DataResponse::new(report)))
}
