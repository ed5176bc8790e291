//! Booking routes
//!
//! Endpoints for the booking lifecycle: creation, listing, status updates,
//! sitter assignment, and sitter recommendations. Mutations go through the
//! orchestrator, which enforces the administrative role.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationMeta, PaginationParams};
use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::bookings::{
    AssignSitterInput, Booking, BookingQuery, CreateBookingInput, UnassignSitterInput,
    UpdateBookingStatusInput,
};
use crate::error::ApiError;
use crate::store::postgres::{BookingRow, BOOKING_COLUMNS};

#[derive(Debug, Deserialize, Default)]
pub struct BookingQueryParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(flatten)]
    pub filter: BookingQuery,
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(input): Json<CreateBookingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .orchestrator
        .create_booking(auth.user_id, input)
        .await?;

    Ok(Created(DataResponse::new(booking)))
}

/// GET /bookings
///
/// List bookings with optional status/client/sitter/series filters.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingQueryParams>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.pagination.page();
    let per_page = query.pagination.per_page();
    let offset = query.pagination.offset() as i64;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bookings
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::uuid IS NULL OR client_id = $2)
        AND ($3::uuid IS NULL OR sitter_id = $3)
        AND ($4::uuid IS NULL OR recurring_series_id = $4)
        "#,
    )
    .bind(&query.filter.status)
    .bind(query.filter.client_id)
    .bind(query.filter.sitter_id)
    .bind(query.filter.recurring_series_id)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS} FROM bookings
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::uuid IS NULL OR client_id = $2)
        AND ($3::uuid IS NULL OR sitter_id = $3)
        AND ($4::uuid IS NULL OR recurring_series_id = $4)
        ORDER BY scheduled_at
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(&query.filter.status)
    .bind(query.filter.client_id)
    .bind(query.filter.sitter_id)
    .bind(query.filter.recurring_series_id)
    .bind(per_page as i64)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<Booking> = rows
        .into_iter()
        .map(Booking::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(Paginated {
        data,
        pagination: PaginationMeta::new(&query.pagination, total as u64),
    }))
}

/// GET /bookings/:booking_id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(DataResponse::new(Booking::try_from(row)?)))
}

/// PATCH /bookings/:booking_id/status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<UpdateBookingStatusInput>,
) -> Result<impl IntoResponse, ApiError> {
    let update = state
        .orchestrator
        .update_booking_status(auth.user_id, booking_id, input)
        .await?;

    Ok(Json(DataResponse::new(update)))
}

/// POST /bookings/:booking_id/sitter
pub async fn assign_sitter(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
    Json(input): Json<AssignSitterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .orchestrator
        .assign_sitter(auth.user_id, booking_id, input)
        .await?;

    Ok(Json(DataResponse::new(booking)))
}

/// DELETE /bookings/:booking_id/sitter
pub async fn unassign_sitter(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    auth: RequireAuth,
    input: Option<Json<UnassignSitterInput>>,
) -> Result<impl IntoResponse, ApiError> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    let booking = state
        .orchestrator
        .unassign_sitter(auth.user_id, booking_id, input)
        .await?;

    Ok(Json(DataResponse::new(booking)))
}

/// GET /bookings/:booking_id/recommendations
///
/// Ranked sitter recommendations, recomputed on every call.
pub async fn list_recommendations(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let recommendations = state.orchestrator.recommendations(booking_id).await?;

    Ok(Json(DataResponse::new(recommendations)))
}
