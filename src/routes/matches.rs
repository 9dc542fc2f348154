use std::convert::Infallible;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post, put},
};
use axum_valid::Valid;
use futures::Stream;

use crate::{
    dao::models::MatchFilter,
    dto::matches::{
        CreateMatchRequest, MatchListQuery, MatchResponse, ParticipantsResponse, RosterResponse,
        ScoreUpdateRequest,
    },
    error::AppError,
    identity::CurrentUser,
    services::{match_service, sse_service},
    state::{SharedState, lifecycle::MatchEvent},
};

/// Read-only match endpoints open to spectators.
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/api/matches", get(list_matches))
        .route("/api/matches/{id}", get(get_match))
        .route("/api/matches/{id}/participants", get(get_participants))
        .route("/api/matches/{id}/roster", get(get_roster))
        .route("/api/matches/{id}/events", get(match_events))
}

/// Match creation, scoring and lifecycle endpoints.
pub fn protected_router() -> Router<SharedState> {
    Router::new()
        .route("/api/matches", post(create_match))
        .route("/api/matches/{id}", put(update_match))
        .route("/api/matches/{id}/start", post(start_match))
        .route("/api/matches/{id}/pause", post(pause_match))
        .route("/api/matches/{id}/resume", post(resume_match))
        .route("/api/matches/{id}/complete", post(complete_match))
}

/// Schedule a new match.
#[utoipa::path(
    post,
    path = "/api/matches",
    tag = "matches",
    params(("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")),
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = MatchResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing caller identity")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let created = match_service::create_match(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List matches, newest first.
#[utoipa::path(
    get,
    path = "/api/matches",
    tag = "matches",
    params(MatchListQuery),
    responses((status = 200, description = "Matches", body = [MatchResponse]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Query(query): Query<MatchListQuery>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    let filter = MatchFilter {
        status: query.status,
        sport: query.sport,
    };
    Ok(Json(match_service::list_matches(&state, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/matches/{id}",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match", body = MatchResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(match_service::get_match(&state, &id).await?))
}

/// Apply a partial score update.
#[utoipa::path(
    put,
    path = "/api/matches/{id}",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    request_body = ScoreUpdateRequest,
    responses(
        (status = 200, description = "Updated match", body = MatchResponse),
        (status = 400, description = "Score does not fit the sport"),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Version mismatch or completed match")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ScoreUpdateRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::update_score(&state, &user, &id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/start",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Match is live", body = MatchResponse),
        (status = 409, description = "Match cannot start from its current status")
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MatchResponse>, AppError> {
    transition(&state, &user, &id, MatchEvent::Start).await
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/pause",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Match paused", body = MatchResponse),
        (status = 409, description = "Match is not live")
    )
)]
pub async fn pause_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MatchResponse>, AppError> {
    transition(&state, &user, &id, MatchEvent::Pause).await
}

#[utoipa::path(
    post,
    path = "/api/matches/{id}/resume",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    responses(
        (status = 200, description = "Match live again", body = MatchResponse),
        (status = 409, description = "Match is not paused")
    )
)]
pub async fn resume_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<MatchResponse>, AppError> {
    transition(&state, &user, &id, MatchEvent::Resume).await
}

/// End the match, optionally with final scores, and compute its result.
#[utoipa::path(
    post,
    path = "/api/matches/{id}/complete",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Match identifier"),
        ("X-User-Id" = String, Header, description = "Caller identity asserted by the gateway")
    ),
    request_body(content = ScoreUpdateRequest, description = "Final scores", content_type = "application/json"),
    responses(
        (status = 200, description = "Match completed with its result", body = MatchResponse),
        (status = 400, description = "Scores missing or invalid"),
        (status = 409, description = "Match is not live or paused")
    )
)]
pub async fn complete_match(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: Option<Json<ScoreUpdateRequest>>,
) -> Result<Json<MatchResponse>, AppError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    Ok(Json(
        match_service::complete_match(&state, &user, &id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/matches/{id}/participants",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Participants", body = ParticipantsResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_participants(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ParticipantsResponse>, AppError> {
    Ok(Json(match_service::participants(&state, &id).await?))
}

#[utoipa::path(
    get,
    path = "/api/matches/{id}/roster",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Participants grouped by side", body = RosterResponse),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_roster(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    Ok(Json(match_service::roster(&state, &id).await?))
}

/// Stream a snapshot of the match followed by its live events.
#[utoipa::path(
    get,
    path = "/api/matches/{id}/events",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match SSE stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn match_events(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = sse_service::subscribe_match(&state, &id).await?;
    Ok(sse_service::to_sse_stream(subscription))
}

async fn transition(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
    event: MatchEvent,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::transition(state, user, id, event).await?,
    ))
}
