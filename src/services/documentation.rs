use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Playkers backend.
#[openapi(
    info(title = "Playkers Back", description = "Venue bookings, live match scoring, notifications and invitations."),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::update_match,
        crate::routes::matches::start_match,
        crate::routes::matches::pause_match,
        crate::routes::matches::resume_match,
        crate::routes::matches::complete_match,
        crate::routes::matches::get_participants,
        crate::routes::matches::get_roster,
        crate::routes::matches::match_events,
        crate::routes::notifications::create_notification,
        crate::routes::notifications::list_notifications,
        crate::routes::notifications::unread_count,
        crate::routes::notifications::update_status,
        crate::routes::notifications::accept,
        crate::routes::notifications::accept_booking,
        crate::routes::notifications::decline,
        crate::routes::notifications::delete_notification,
        crate::routes::invitations::create_invitation,
        crate::routes::invitations::list_invitations,
        crate::routes::invitations::get_invitation,
        crate::routes::invitations::revoke_invitation,
        crate::routes::invitations::accept_invitation,
        crate::routes::bookings::create_booking,
        crate::routes::bookings::list_bookings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::ScoreUpdateRequest,
            crate::dto::matches::MatchResponse,
            crate::dto::matches::ParticipantResponse,
            crate::dto::matches::ParticipantsResponse,
            crate::dto::matches::RosterSide,
            crate::dto::matches::RosterResponse,
            crate::dto::matches::ResultType,
            crate::dto::matches::ResultSummary,
            crate::dto::sse::MatchStatusEvent,
            crate::dto::notifications::CreateNotificationRequest,
            crate::dto::notifications::UpdateNotificationStatusRequest,
            crate::dto::notifications::NotificationResponse,
            crate::dto::notifications::UnreadCountResponse,
            crate::dto::notifications::SenderContact,
            crate::dto::notifications::AcceptNotificationResponse,
            crate::dto::notifications::AcceptBookingResponse,
            crate::dto::invitations::CreateInvitationRequest,
            crate::dto::invitations::AcceptInvitationRequest,
            crate::dto::invitations::InvitationResponse,
            crate::dto::bookings::CreateBookingRequest,
            crate::dto::bookings::BookingResponse,
            crate::dao::models::Sport,
            crate::dao::models::MatchStatus,
            crate::dao::models::TeamSide,
            crate::dao::models::TeamScore,
            crate::dao::models::CricketScore,
            crate::dao::models::NotificationKind,
            crate::dao::models::NotificationStatus,
            crate::dao::models::InvitationKind,
            crate::dao::models::InvitationStatus,
            crate::dao::models::BookingStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match creation, live scoring and spectator streams"),
        (name = "notifications", description = "Match and booking requests between users"),
        (name = "invitations", description = "Email invitations to matches and teams"),
        (name = "bookings", description = "Venue slot reservations"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/api/matches",
            "/api/matches/{id}",
            "/api/matches/{id}/events",
            "/api/notifications/{id}/accept-booking",
            "/api/invitations/accept",
            "/api/bookings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
