use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::invitations::{AcceptInvitationRequest, CreateInvitationRequest, InvitationResponse},
    error::AppError,
    identity::CurrentUser,
    services::invitation_service,
    state::SharedState,
};

/// Invitation issuing, revocation and redemption.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/invitations",
            get(list_invitations).post(create_invitation),
        )
        .route("/api/invitations/accept", post(accept_invitation))
        .route(
            "/api/invitations/{id}",
            get(get_invitation).delete(revoke_invitation),
        )
}

/// Invite someone by email to a match or a team.
#[utoipa::path(
    post,
    path = "/api/invitations",
    tag = "invitations",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation issued with its share link", body = InvitationResponse),
        (status = 400, description = "Invalid email or missing target"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn create_invitation(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<CreateInvitationRequest>>,
) -> Result<(StatusCode, Json<InvitationResponse>), AppError> {
    let created = invitation_service::create_invitation(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/invitations",
    tag = "invitations",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    responses((status = 200, description = "Invitations issued by the caller", body = [InvitationResponse]))
)]
pub async fn list_invitations(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<InvitationResponse>>, AppError> {
    Ok(Json(
        invitation_service::list_invitations(&state, &user).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/invitations/{id}",
    tag = "invitations",
    params(
        ("id" = String, Path, description = "Invitation identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Invitation", body = InvitationResponse),
        (status = 404, description = "Unknown invitation")
    )
)]
pub async fn get_invitation(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<InvitationResponse>, AppError> {
    Ok(Json(
        invitation_service::get_invitation(&state, &user, &id).await?,
    ))
}

/// Revoke a pending invitation.
#[utoipa::path(
    delete,
    path = "/api/invitations/{id}",
    tag = "invitations",
    params(
        ("id" = String, Path, description = "Invitation identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Invitation revoked", body = InvitationResponse),
        (status = 403, description = "Caller did not issue the invitation"),
        (status = 409, description = "Invitation already accepted or expired")
    )
)]
pub async fn revoke_invitation(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<InvitationResponse>, AppError> {
    Ok(Json(
        invitation_service::revoke_invitation(&state, &user, &id).await?,
    ))
}

/// Redeem an invitation token.
#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    tag = "invitations",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    request_body = AcceptInvitationRequest,
    responses(
        (status = 200, description = "Invitation accepted", body = InvitationResponse),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Invitation already accepted or revoked"),
        (status = 410, description = "Invitation expired")
    )
)]
pub async fn accept_invitation(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<AcceptInvitationRequest>>,
) -> Result<Json<InvitationResponse>, AppError> {
    Ok(Json(
        invitation_service::accept_invitation(&state, &user, &payload.token).await?,
    ))
}
