//! Email invitations to a match or a team, redeemed once through a bearer token.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use rand::{Rng, distr::Alphanumeric};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            InvitationEntity, InvitationKind, InvitationStatus, ParticipantEntity,
            TeamMemberEntity,
        },
        store::PlaykersStore,
    },
    dto::invitations::{CreateInvitationRequest, InvitationResponse},
    error::ServiceError,
    identity::CurrentUser,
    services::match_service,
    state::{
        SharedState,
        lifecycle::{StatusChange, plan_revocation},
    },
};

/// Length of the generated bearer token.
pub const TOKEN_LENGTH: usize = 40;
/// Role given to players who join a team through an invitation.
const TEAM_MEMBER_ROLE: &str = "member";

fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("invitation `{id}` not found"))
}

/// Issue an invitation and return it with its share link.
pub async fn create_invitation(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateInvitationRequest,
) -> Result<InvitationResponse, ServiceError> {
    let store = state.require_store().await?;

    let (match_id, team_id) = match request.invitation_type {
        InvitationKind::Match => {
            let match_id = request.match_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| {
                ServiceError::InvalidInput("matchId is required for match invitations".into())
            })?;
            match_service::load_match(state, &match_id).await?;
            (Some(match_id), None)
        }
        InvitationKind::Team => {
            let team_id = request.team_id.filter(|id| !id.trim().is_empty()).ok_or_else(|| {
                ServiceError::InvalidInput("teamId is required for team invitations".into())
            })?;
            (None, Some(team_id))
        }
    };

    let ttl = request
        .expires_in_hours
        .map(|hours| Duration::from_secs(u64::from(hours) * 3600))
        .unwrap_or_else(|| state.config().invitation_ttl());
    let now = SystemTime::now();
    let entity = InvitationEntity {
        id: Uuid::new_v4().to_string(),
        email: request.email.trim().to_lowercase(),
        kind: request.invitation_type,
        match_id,
        team_id,
        status: InvitationStatus::Pending,
        token: generate_token(),
        invited_by: user.id.clone(),
        expires_at: now + ttl,
        accepted_by: None,
        accepted_at: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_invitation(entity.clone()).await?;
    info!(
        invitation_id = %entity.id,
        kind = entity.kind.as_str(),
        invited_by = %user.id,
        "invitation issued"
    );

    Ok(InvitationResponse::project(
        entity,
        Some(state.config().public_base_url()),
    ))
}

/// Invitations issued by the caller, newest first.
pub async fn list_invitations(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<Vec<InvitationResponse>, ServiceError> {
    let store = state.require_store().await?;
    let base_url = state.config().public_base_url();
    let invitations = store.list_invitations(user.id.clone()).await?;
    Ok(invitations
        .into_iter()
        .map(|entity| InvitationResponse::project(entity, Some(base_url)))
        .collect())
}

/// Fetch one invitation; the share link is only disclosed to its issuer.
pub async fn get_invitation(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<InvitationResponse, ServiceError> {
    let store = state.require_store().await?;
    let entity = store
        .find_invitation(id.to_owned())
        .await?
        .ok_or_else(|| not_found(id))?;
    let base_url = (entity.invited_by == user.id).then(|| state.config().public_base_url());
    Ok(InvitationResponse::project(entity, base_url))
}

/// Revoke a pending invitation. Revoking twice is a no-op.
pub async fn revoke_invitation(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<InvitationResponse, ServiceError> {
    let store = state.require_store().await?;
    let current = store
        .find_invitation(id.to_owned())
        .await?
        .ok_or_else(|| not_found(id))?;
    if current.invited_by != user.id {
        return Err(ServiceError::Forbidden(format!(
            "only the issuer may revoke invitation `{id}`"
        )));
    }

    let base_url = Some(state.config().public_base_url());
    let next = match plan_revocation(current.status)? {
        StatusChange::Unchanged => return Ok(InvitationResponse::project(current, base_url)),
        StatusChange::Transition(next) => next,
    };

    let mut revoked = current;
    revoked.status = next;
    revoked.updated_at = SystemTime::now();
    if !store
        .replace_invitation(revoked.clone(), InvitationStatus::Pending)
        .await?
    {
        return Err(ServiceError::InvalidState(format!(
            "invitation `{id}` changed before it could be revoked"
        )));
    }

    info!(invitation_id = %id, "invitation revoked");
    Ok(InvitationResponse::project(revoked, base_url))
}

/// Redeem `token` for the caller.
///
/// Succeeds once, while the invitation is pending and unexpired. Side effects (match
/// participation, team membership) follow the acceptance write.
pub async fn accept_invitation(
    state: &SharedState,
    user: &CurrentUser,
    token: &str,
) -> Result<InvitationResponse, ServiceError> {
    let store = state.require_store().await?;
    let current = store
        .find_invitation_by_token(token.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound("invitation not found".into()))?;

    match current.status {
        InvitationStatus::Pending => {}
        InvitationStatus::Accepted => {
            return Err(ServiceError::InvalidState(
                "invitation has already been accepted".into(),
            ));
        }
        InvitationStatus::Revoked => {
            return Err(ServiceError::InvalidState(
                "invitation has been revoked".into(),
            ));
        }
        InvitationStatus::Expired => {
            return Err(ServiceError::Gone("invitation has expired".into()));
        }
    }

    let now = SystemTime::now();
    if current.expires_at <= now {
        mark_expired(&store, current, now).await;
        return Err(ServiceError::Gone("invitation has expired".into()));
    }

    let mut accepted = current;
    accepted.status = InvitationStatus::Accepted;
    accepted.accepted_by = Some(user.id.clone());
    accepted.accepted_at = Some(now);
    accepted.updated_at = now;
    if !store
        .replace_invitation(accepted.clone(), InvitationStatus::Pending)
        .await?
    {
        return Err(ServiceError::InvalidState(
            "invitation is no longer pending".into(),
        ));
    }
    info!(invitation_id = %accepted.id, user_id = %user.id, "invitation accepted");

    apply_membership(state, &store, user, &accepted, now).await;

    Ok(InvitationResponse::project(accepted, None))
}

async fn mark_expired(store: &Arc<dyn PlaykersStore>, current: InvitationEntity, now: SystemTime) {
    let id = current.id.clone();
    let mut expired = current;
    expired.status = InvitationStatus::Expired;
    expired.updated_at = now;
    match store
        .replace_invitation(expired, InvitationStatus::Pending)
        .await
    {
        Ok(true) => info!(invitation_id = %id, "invitation expired"),
        Ok(false) => {}
        Err(err) => warn!(invitation_id = %id, error = %err, "failed to mark invitation expired"),
    }
}

async fn apply_membership(
    state: &SharedState,
    store: &Arc<dyn PlaykersStore>,
    user: &CurrentUser,
    invitation: &InvitationEntity,
    now: SystemTime,
) {
    match (invitation.kind, &invitation.match_id, &invitation.team_id) {
        (InvitationKind::Match, Some(match_id), _) => {
            let participant = ParticipantEntity {
                user_id: user.id.clone(),
                name: user.display_name().to_owned(),
                team: None,
                joined_at: now,
            };
            if let Err(err) = match_service::add_participant(state, match_id, participant).await
            {
                warn!(invitation_id = %invitation.id, match_id = %match_id, error = %err, "failed to add participant after acceptance");
            }
        }
        (InvitationKind::Team, _, Some(team_id)) => {
            let member = TeamMemberEntity {
                team_id: team_id.clone(),
                user_id: user.id.clone(),
                role: TEAM_MEMBER_ROLE.into(),
                joined_at: now,
            };
            if let Err(err) = store.upsert_team_member(member).await {
                warn!(invitation_id = %invitation.id, team_id = %team_id, error = %err, "failed to record team membership after acceptance");
            }
        }
        _ => warn!(invitation_id = %invitation.id, "accepted invitation has no target"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::Sport,
        dto::matches::CreateMatchRequest,
        services::test_support::{BASE_URL, memory_state, user},
    };

    async fn create_match(state: &SharedState) -> String {
        match_service::create_match(
            state,
            &user("captain"),
            CreateMatchRequest {
                sport: Sport::Football,
                team1_id: None,
                team2_id: None,
                team1_name: "Reds".into(),
                team2_name: "Blues".into(),
                venue_id: None,
                scheduled_at: None,
                match_data: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn match_invitation(match_id: &str) -> CreateInvitationRequest {
        CreateInvitationRequest {
            email: "Guest@Example.com".into(),
            invitation_type: InvitationKind::Match,
            match_id: Some(match_id.into()),
            team_id: None,
            expires_in_hours: None,
        }
    }

    fn token_of(invitation: &InvitationResponse) -> String {
        invitation
            .share_link
            .as_deref()
            .and_then(|link| link.rsplit('/').next())
            .unwrap()
            .to_owned()
    }

    #[test]
    fn tokens_are_long_and_alphanumeric() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn create_returns_share_link() {
        let (state, _store) = memory_state();
        let match_id = create_match(&state).await;
        let invitation = create_invitation(&state, &user("captain"), match_invitation(&match_id))
            .await
            .unwrap();

        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.email, "guest@example.com");
        let link = invitation.share_link.clone().unwrap();
        assert!(link.starts_with(&format!("{BASE_URL}/accept-invite/")));
        assert_eq!(token_of(&invitation).len(), TOKEN_LENGTH);
    }

    #[tokio::test]
    async fn match_invitation_requires_existing_match() {
        let (state, _store) = memory_state();
        let err = create_invitation(&state, &user("captain"), match_invitation("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mut request = match_invitation("missing");
        request.match_id = None;
        let err = create_invitation(&state, &user("captain"), request)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn accepting_adds_participant_and_cannot_be_replayed() {
        let (state, _store) = memory_state();
        let match_id = create_match(&state).await;
        let invitation = create_invitation(&state, &user("captain"), match_invitation(&match_id))
            .await
            .unwrap();
        let token = token_of(&invitation);

        let accepted = accept_invitation(&state, &user("guest"), &token)
            .await
            .unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.accepted_by.as_deref(), Some("guest"));
        assert!(accepted.share_link.is_none());

        let participants = match_service::participants(&state, &match_id).await.unwrap();
        assert_eq!(participants.participants.len(), 1);
        assert_eq!(participants.participants[0].user_id, "guest");

        let err = accept_invitation(&state, &user("other"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let still = get_invitation(&state, &user("captain"), &invitation.id)
            .await
            .unwrap();
        assert_eq!(still.accepted_by.as_deref(), Some("guest"));
    }

    #[tokio::test]
    async fn revoked_invitation_cannot_be_accepted() {
        let (state, _store) = memory_state();
        let match_id = create_match(&state).await;
        let invitation = create_invitation(&state, &user("captain"), match_invitation(&match_id))
            .await
            .unwrap();

        let err = revoke_invitation(&state, &user("guest"), &invitation.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let revoked = revoke_invitation(&state, &user("captain"), &invitation.id)
            .await
            .unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
        revoke_invitation(&state, &user("captain"), &invitation.id)
            .await
            .unwrap();

        let err = accept_invitation(&state, &user("guest"), &token_of(&invitation))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn expired_invitation_is_gone_and_marked() {
        let (state, store) = memory_state();
        let now = SystemTime::now();
        let entity = InvitationEntity {
            id: "inv-old".into(),
            email: "late@example.com".into(),
            kind: InvitationKind::Team,
            match_id: None,
            team_id: Some("team-7".into()),
            status: InvitationStatus::Pending,
            token: "expiredtoken".into(),
            invited_by: "captain".into(),
            expires_at: now - Duration::from_secs(60),
            accepted_by: None,
            accepted_at: None,
            created_at: now - Duration::from_secs(3600),
            updated_at: now - Duration::from_secs(3600),
        };
        store.insert_invitation(entity).await.unwrap();

        let err = accept_invitation(&state, &user("late"), "expiredtoken")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Gone(_)));

        let stored = store.find_invitation("inv-old".into()).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
        assert!(store.team_members().is_empty());
    }

    #[tokio::test]
    async fn team_invitation_records_membership() {
        let (state, store) = memory_state();
        let invitation = create_invitation(
            &state,
            &user("captain"),
            CreateInvitationRequest {
                email: "new@example.com".into(),
                invitation_type: InvitationKind::Team,
                match_id: None,
                team_id: Some("team-7".into()),
                expires_in_hours: Some(2),
            },
        )
        .await
        .unwrap();

        accept_invitation(&state, &user("newbie"), &token_of(&invitation))
            .await
            .unwrap();

        let members = store.team_members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].team_id, "team-7");
        assert_eq!(members[0].user_id, "newbie");
        assert_eq!(members[0].role, "member");
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let (state, _store) = memory_state();
        let err = accept_invitation(&state, &user("guest"), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
