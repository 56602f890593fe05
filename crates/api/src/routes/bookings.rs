//! Booking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use common::ReservationCode;
use saga::{
    BookingConfirmation, BookingSummary, CancellationResult, CreateBookingRequest, Identity,
};

use crate::AppState;
use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller's identity, taken from headers set by the edge.
pub struct Caller(pub Identity);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?;
        let email = header(parts, USER_EMAIL_HEADER).unwrap_or_default();

        let identity = Identity::new(user_id, email);
        Ok(Caller(match header(parts, USER_ROLE_HEADER) {
            Some(role) => identity.with_role(role),
            None => identity,
        }))
    }
}

/// POST /bookings: book seats for one or two legs.
#[tracing::instrument(skip(state, caller, body), fields(user_id = %caller.0.user_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingConfirmation>), ApiError> {
    let Json(request) = body?;
    let confirmation = state.orchestrator.create_booking(&caller.0, request).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// GET /bookings/my: the caller's bookings, newest first.
#[tracing::instrument(skip(state, caller), fields(user_id = %caller.0.user_id))]
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<BookingSummary>>, ApiError> {
    Ok(Json(state.orchestrator.list_bookings(&caller.0).await?))
}

/// GET /bookings/{code}
#[tracing::instrument(skip(state, caller), fields(user_id = %caller.0.user_id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(code): Path<String>,
) -> Result<Json<BookingSummary>, ApiError> {
    let code = ReservationCode::new(code);
    Ok(Json(state.orchestrator.get_booking(&caller.0, &code).await?))
}

/// DELETE /bookings/cancel/{code}
#[tracing::instrument(skip(state, caller), fields(user_id = %caller.0.user_id))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(code): Path<String>,
) -> Result<Json<CancellationResult>, ApiError> {
    let code = ReservationCode::new(code);
    Ok(Json(state.orchestrator.cancel_booking(&caller.0, &code).await?))
}
