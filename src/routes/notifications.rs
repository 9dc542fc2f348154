use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use axum_valid::Valid;

use crate::{
    dto::notifications::{
        AcceptBookingResponse, AcceptNotificationResponse, CreateNotificationRequest,
        NotificationListQuery, NotificationResponse, UnreadCountResponse,
        UpdateNotificationStatusRequest,
    },
    error::AppError,
    identity::CurrentUser,
    services::notification_service,
    state::SharedState,
};

/// Inbox endpoints; every route acts on behalf of the caller.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/{id}", delete(delete_notification))
        .route("/api/notifications/{id}/status", patch(update_status))
        .route("/api/notifications/{id}/accept", patch(accept))
        .route("/api/notifications/{id}/accept-booking", patch(accept_booking))
        .route("/api/notifications/{id}/decline", patch(decline))
}

/// Send a match or booking request to another user.
#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "notifications",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification delivered", body = NotificationResponse),
        (status = 400, description = "Invalid payload or self-addressed request")
    )
)]
pub async fn create_notification(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<CreateNotificationRequest>>,
) -> Result<(StatusCode, Json<NotificationResponse>), AppError> {
    let created = notification_service::create_notification(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(
        NotificationListQuery,
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses((status = 200, description = "Notifications", body = [NotificationResponse]))
)]
pub async fn list_notifications(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    Ok(Json(
        notification_service::list_notifications(&state, &user, query.status).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "notifications",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    responses((status = 200, description = "Number of unread notifications", body = UnreadCountResponse))
)]
pub async fn unread_count(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UnreadCountResponse>, AppError> {
    Ok(Json(notification_service::unread_count(&state, &user).await?))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/status",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    request_body = UpdateNotificationStatusRequest,
    responses(
        (status = 200, description = "Updated notification", body = NotificationResponse),
        (status = 403, description = "Caller is not the recipient"),
        (status = 404, description = "Unknown notification"),
        (status = 409, description = "Status change not allowed")
    )
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNotificationStatusRequest>,
) -> Result<Json<NotificationResponse>, AppError> {
    Ok(Json(
        notification_service::update_status(&state, &user, &id, payload.status).await?,
    ))
}

/// Accept a match request and get the pre-filled match creation redirect.
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/accept",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Request accepted", body = AcceptNotificationResponse),
        (status = 400, description = "Notification is not a match request"),
        (status = 403, description = "Caller is not the recipient"),
        (status = 409, description = "Notification already declined")
    )
)]
pub async fn accept(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<AcceptNotificationResponse>, AppError> {
    Ok(Json(notification_service::accept(&state, &user, &id).await?))
}

/// Accept a booking request: confirm the booking and notify the requester.
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/accept-booking",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Booking accepted, possibly partially", body = AcceptBookingResponse),
        (status = 400, description = "Notification is not a booking request"),
        (status = 403, description = "Caller is not the recipient"),
        (status = 409, description = "Slot already taken or notification declined")
    )
)]
pub async fn accept_booking(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<AcceptBookingResponse>, AppError> {
    Ok(Json(
        notification_service::accept_booking(&state, &user, &id).await?,
    ))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/decline",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Request declined", body = NotificationResponse),
        (status = 403, description = "Caller is not the recipient"),
        (status = 409, description = "Notification already accepted")
    )
)]
pub async fn decline(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, AppError> {
    Ok(Json(notification_service::decline(&state, &user, &id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Caller is not the recipient"),
        (status = 404, description = "Unknown notification")
    )
)]
pub async fn delete_notification(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    notification_service::delete_notification(&state, &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
