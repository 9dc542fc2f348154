use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{InvitationEntity, InvitationKind, InvitationStatus},
    dto::format_system_time,
};

/// Payload used to invite someone to a match or a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    pub invitation_type: InvitationKind,
    /// Required for `match` invitations.
    #[serde(default)]
    pub match_id: Option<String>,
    /// Required for `team` invitations.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Overrides the configured lifetime.
    #[serde(default)]
    #[validate(range(min = 1, max = 720))]
    pub expires_in_hours: Option<u32>,
}

/// Token presented by the invitee.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1, max = 128))]
    pub token: String,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: String,
    pub email: String,
    pub invitation_type: InvitationKind,
    pub match_id: Option<String>,
    pub team_id: Option<String>,
    pub status: InvitationStatus,
    pub invited_by: String,
    pub expires_at: String,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<String>,
    pub created_at: String,
    /// Acceptance link, only disclosed to the issuer.
    pub share_link: Option<String>,
}

impl InvitationResponse {
    /// Project an invitation, exposing its share link only when `base_url` is given.
    pub fn project(value: InvitationEntity, base_url: Option<&str>) -> Self {
        let share_link = base_url.map(|base| share_link(base, &value.token));
        Self {
            id: value.id,
            email: value.email,
            invitation_type: value.kind,
            match_id: value.match_id,
            team_id: value.team_id,
            status: value.status,
            invited_by: value.invited_by,
            expires_at: format_system_time(value.expires_at),
            accepted_by: value.accepted_by,
            accepted_at: value.accepted_at.map(format_system_time),
            created_at: format_system_time(value.created_at),
            share_link,
        }
    }
}

/// Client URL that redeems `token`.
pub fn share_link(base_url: &str, token: &str) -> String {
    format!("{}/accept-invite/{token}", base_url.trim_end_matches('/'))
}
