use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::bookings::{BookingResponse, CreateBookingRequest},
    error::AppError,
    identity::CurrentUser,
    services::booking_service,
    state::SharedState,
};

/// Venue booking endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/bookings", get(list_bookings).post(create_booking))
}

/// Request a venue slot; the venue owner is notified.
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "bookings",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking requested", body = BookingResponse),
        (status = 400, description = "Invalid slot"),
        (status = 409, description = "Slot overlaps a confirmed booking")
    )
)]
pub async fn create_booking(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<CreateBookingRequest>>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let created = booking_service::create_booking(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "bookings",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    responses((status = 200, description = "The caller's bookings by start time", body = [BookingResponse]))
)]
pub async fn list_bookings(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    Ok(Json(booking_service::list_bookings(&state, &user).await?))
}
