//! Business logic behind the match routes: creation, public reads, score updates and
//! lifecycle transitions. Every write is a compare-and-set on the match version.

use std::time::SystemTime;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{
        MatchEntity, MatchFilter, MatchStatus, ParticipantEntity, TeamScore, TeamSide,
    },
    dto::{
        matches::{
            CreateMatchRequest, MatchResponse, ParticipantsResponse, RosterResponse,
            ScoreUpdateRequest,
        },
        parse_timestamp,
    },
    error::ServiceError,
    identity::CurrentUser,
    services::{scoring, sse_events},
    state::{
        SharedState,
        lifecycle::{MatchEvent, next_match_status},
    },
};

fn match_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("match `{id}` not found"))
}

/// Schedule a new match owned by `user`.
pub async fn create_match(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.require_store().await?;

    let scheduled_at = request
        .scheduled_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(|err| ServiceError::InvalidInput(format!("invalid scheduledAt: {err}")))?;

    let team1_id = request
        .team1_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let team2_id = request
        .team2_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if team1_id == team2_id {
        return Err(ServiceError::InvalidInput(
            "a match needs two different teams".into(),
        ));
    }

    let mut match_data = IndexMap::new();
    if let Some(initial) = request.match_data {
        scoring::merge_match_data(&mut match_data, initial);
    }

    let now = SystemTime::now();
    let entity = MatchEntity {
        id: Uuid::new_v4().to_string(),
        sport: request.sport,
        status: MatchStatus::Upcoming,
        team1_id,
        team2_id,
        team1_name: request.team1_name.trim().to_owned(),
        team2_name: request.team2_name.trim().to_owned(),
        team1_score: None,
        team2_score: None,
        match_data,
        participants: Vec::new(),
        created_by: user.id.clone(),
        venue_id: request.venue_id,
        scheduled_at,
        created_at: now,
        updated_at: now,
        version: 1,
    };

    store.insert_match(entity.clone()).await?;
    info!(match_id = %entity.id, sport = entity.sport.as_str(), created_by = %user.id, "match created");
    Ok(entity.into())
}

/// Load a match or fail with not-found.
pub async fn load_match(state: &SharedState, id: &str) -> Result<MatchEntity, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_match(id.to_owned())
        .await?
        .ok_or_else(|| match_not_found(id))
}

pub async fn get_match(state: &SharedState, id: &str) -> Result<MatchResponse, ServiceError> {
    Ok(load_match(state, id).await?.into())
}

pub async fn list_matches(
    state: &SharedState,
    filter: MatchFilter,
) -> Result<Vec<MatchResponse>, ServiceError> {
    let store = state.require_store().await?;
    let matches = store.list_matches(filter).await?;
    Ok(matches.into_iter().map(Into::into).collect())
}

pub async fn participants(
    state: &SharedState,
    id: &str,
) -> Result<ParticipantsResponse, ServiceError> {
    let entity = load_match(state, id).await?;
    Ok(ParticipantsResponse {
        match_id: entity.id,
        participants: entity.participants.into_iter().map(Into::into).collect(),
    })
}

pub async fn roster(state: &SharedState, id: &str) -> Result<RosterResponse, ServiceError> {
    Ok(load_match(state, id).await?.into())
}

/// Apply a partial score update and broadcast it to spectators.
pub async fn update_score(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
    request: ScoreUpdateRequest,
) -> Result<MatchResponse, ServiceError> {
    let ScoreUpdateRequest {
        team1_score,
        team2_score,
        match_data,
        expected_version,
    } = request;

    let updated = mutate_match(state, id, expected_version, |entity| {
        if entity.status == MatchStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "match `{}` is completed and can no longer be scored",
                entity.id
            )));
        }
        apply_score_patch(entity, team1_score.clone(), team2_score.clone(), match_data.clone())
    })
    .await?;

    debug!(match_id = %updated.id, version = updated.version, user_id = %user.id, "score updated");
    sse_events::broadcast_match_updated(state, &updated);
    Ok(updated.into())
}

/// Move a match through `start`, `pause` or `resume`.
pub async fn transition(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
    event: MatchEvent,
) -> Result<MatchResponse, ServiceError> {
    if event == MatchEvent::Complete {
        return complete_match(state, user, id, ScoreUpdateRequest::default()).await;
    }

    let updated = mutate_match(state, id, None, |entity| {
        entity.status = next_match_status(entity.status, event)?;
        Ok(())
    })
    .await?;

    info!(match_id = %updated.id, event = %event, status = updated.status.as_str(), user_id = %user.id, "match transitioned");
    sse_events::broadcast_match_status(state, &updated);
    Ok(updated.into())
}

/// Merge the final scores, compute the result and mark the match completed.
pub async fn complete_match(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
    request: ScoreUpdateRequest,
) -> Result<MatchResponse, ServiceError> {
    let ScoreUpdateRequest {
        team1_score,
        team2_score,
        match_data,
        expected_version,
    } = request;

    let updated = mutate_match(state, id, expected_version, |entity| {
        let next = next_match_status(entity.status, MatchEvent::Complete)?;
        apply_score_patch(entity, team1_score.clone(), team2_score.clone(), match_data.clone())?;
        let summary = scoring::compute_result(entity)?;
        scoring::store_result(&mut entity.match_data, &summary)?;
        entity.status = next;
        Ok(())
    })
    .await?;

    info!(match_id = %updated.id, user_id = %user.id, "match completed");
    sse_events::broadcast_match_completed(state, &updated);
    Ok(updated.into())
}

/// Add `participant` to the match unless they already joined.
pub async fn add_participant(
    state: &SharedState,
    match_id: &str,
    participant: ParticipantEntity,
) -> Result<MatchEntity, ServiceError> {
    let current = load_match(state, match_id).await?;
    if current
        .participants
        .iter()
        .any(|existing| existing.user_id == participant.user_id)
    {
        return Ok(current);
    }

    let updated = mutate_match(state, match_id, None, |entity| {
        if !entity
            .participants
            .iter()
            .any(|existing| existing.user_id == participant.user_id)
        {
            entity.participants.push(participant.clone());
        }
        Ok(())
    })
    .await?;

    sse_events::broadcast_participants(state, &updated);
    Ok(updated)
}

fn apply_score_patch(
    entity: &mut MatchEntity,
    team1_score: Option<TeamScore>,
    team2_score: Option<TeamScore>,
    match_data: Option<IndexMap<String, Value>>,
) -> Result<(), ServiceError> {
    if let Some(score) = team1_score {
        scoring::validate_score(entity.sport, TeamSide::Team1, &score)?;
        entity.team1_score = Some(score);
    }
    if let Some(score) = team2_score {
        scoring::validate_score(entity.sport, TeamSide::Team2, &score)?;
        entity.team2_score = Some(score);
    }
    if let Some(patch) = match_data {
        scoring::merge_match_data(&mut entity.match_data, patch);
    }
    Ok(())
}

/// Read-modify-write loop guarded by the match version.
///
/// With `expected_version` the caller's view must still be current, and a single
/// attempt is made. Without it the read is retried up to the configured limit.
async fn mutate_match<F>(
    state: &SharedState,
    id: &str,
    expected_version: Option<u64>,
    mut mutate: F,
) -> Result<MatchEntity, ServiceError>
where
    F: FnMut(&mut MatchEntity) -> Result<(), ServiceError>,
{
    let store = state.require_store().await?;
    let attempts = match expected_version {
        Some(_) => 1,
        None => state.config().max_update_retries(),
    };

    for attempt in 1..=attempts {
        let mut entity = store
            .find_match(id.to_owned())
            .await?
            .ok_or_else(|| match_not_found(id))?;

        let observed = entity.version;
        if let Some(expected) = expected_version {
            if observed != expected {
                return Err(ServiceError::InvalidState(format!(
                    "match `{id}` is at version {observed}, expected {expected}"
                )));
            }
        }

        mutate(&mut entity)?;
        entity.version = observed + 1;
        entity.updated_at = SystemTime::now();

        if store.replace_match(entity.clone(), observed).await? {
            return Ok(entity);
        }
        debug!(match_id = %id, attempt, "match changed concurrently; retrying");
    }

    Err(ServiceError::InvalidState(format!(
        "match `{id}` was modified concurrently; reload and retry"
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        dao::models::{CricketScore, Sport},
        dto::matches::{ResultSummary, ResultType},
        services::{
            scoring::RESULT_SUMMARY_KEY,
            test_support::{memory_state, user},
        },
    };

    fn cricket_request() -> CreateMatchRequest {
        CreateMatchRequest {
            sport: Sport::Cricket,
            team1_id: Some("lions".into()),
            team2_id: Some("tigers".into()),
            team1_name: "Lions".into(),
            team2_name: "Tigers".into(),
            venue_id: None,
            scheduled_at: Some("2026-05-01T14:00:00Z".into()),
            match_data: None,
        }
    }

    fn cricket(runs: u32, wickets: u8, overs: &str) -> TeamScore {
        TeamScore::Cricket(CricketScore {
            runs,
            wickets,
            overs: overs.into(),
        })
    }

    #[tokio::test]
    async fn create_match_starts_upcoming_at_version_one() {
        let (state, _store) = memory_state();
        let created = create_match(&state, &user("scorer"), cricket_request())
            .await
            .unwrap();

        assert_eq!(created.status, MatchStatus::Upcoming);
        assert_eq!(created.version, 1);
        assert_eq!(created.created_by, "scorer");
        assert_eq!(created.scheduled_at.as_deref(), Some("2026-05-01T14:00:00Z"));
    }

    #[tokio::test]
    async fn create_match_rejects_bad_schedule() {
        let (state, _store) = memory_state();
        let mut request = cricket_request();
        request.scheduled_at = Some("next friday".into());

        let err = create_match(&state, &user("scorer"), request)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn cricket_update_persists_team1_and_keeps_team2() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();
        transition(&state, &scorer, &created.id, MatchEvent::Start)
            .await
            .unwrap();

        let first = ScoreUpdateRequest {
            team2_score: Some(cricket(40, 1, "5")),
            ..Default::default()
        };
        update_score(&state, &scorer, &created.id, first).await.unwrap();

        let second = ScoreUpdateRequest {
            team1_score: Some(cricket(120, 3, "15.2")),
            ..Default::default()
        };
        let updated = update_score(&state, &scorer, &created.id, second)
            .await
            .unwrap();

        assert_eq!(updated.team1_score, Some(cricket(120, 3, "15.2")));
        assert_eq!(updated.team2_score, Some(cricket(40, 1, "5")));

        let stored = get_match(&state, &created.id).await.unwrap();
        assert_eq!(stored.team1_score, Some(cricket(120, 3, "15.2")));
        assert_eq!(stored.team2_score, Some(cricket(40, 1, "5")));
    }

    #[tokio::test]
    async fn update_merges_match_data() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let mut request = cricket_request();
        let mut initial = IndexMap::new();
        initial.insert("toss".to_string(), json!({"winner": "team1", "decision": "bat"}));
        initial.insert("striker".to_string(), json!("Asha"));
        request.match_data = Some(initial);
        let created = create_match(&state, &scorer, request).await.unwrap();

        let mut patch = IndexMap::new();
        patch.insert("striker".to_string(), Value::Null);
        patch.insert("bowler".to_string(), json!("Ravi"));
        let updated = update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                match_data: Some(patch),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.match_data["toss"]["decision"], "bat");
        assert_eq!(updated.match_data["bowler"], "Ravi");
        assert!(!updated.match_data.contains_key("striker"));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();
        update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(cricket(4, 0, "0.1")),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(cricket(8, 0, "0.2")),
                expected_version: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn wrong_score_shape_is_rejected() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();

        let err = update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(TeamScore::Points(3)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn completing_cricket_match_records_result() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();
        transition(&state, &scorer, &created.id, MatchEvent::Start)
            .await
            .unwrap();

        let completed = complete_match(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(cricket(150, 6, "20")),
                team2_score: Some(cricket(140, 9, "20")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(completed.status, MatchStatus::Completed);
        let summary: ResultSummary =
            serde_json::from_value(completed.match_data[RESULT_SUMMARY_KEY].clone()).unwrap();
        assert_eq!(summary.result_type, ResultType::WonByRuns);
        assert_eq!(summary.margin_runs, Some(10));
        assert_eq!(summary.winner_id.as_deref(), Some("lions"));

        let err = update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(cricket(151, 6, "20")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn invalid_transitions_conflict() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();

        let err = transition(&state, &scorer, &created.id, MatchEvent::Pause)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let live = transition(&state, &scorer, &created.id, MatchEvent::Start)
            .await
            .unwrap();
        assert_eq!(live.status, MatchStatus::Live);
        assert_eq!(live.version, 2);

        let err = transition(&state, &scorer, &created.id, MatchEvent::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn roster_groups_participants_by_side() {
        let (state, _store) = memory_state();
        let created = create_match(&state, &user("scorer"), cricket_request())
            .await
            .unwrap();
        let now = SystemTime::now();
        for (id, team) in [
            ("p1", Some(TeamSide::Team1)),
            ("p2", Some(TeamSide::Team2)),
            ("p3", None),
        ] {
            add_participant(
                &state,
                &created.id,
                ParticipantEntity {
                    user_id: id.into(),
                    name: id.to_uppercase(),
                    team,
                    joined_at: now,
                },
            )
            .await
            .unwrap();
        }

        let roster = roster(&state, &created.id).await.unwrap();
        assert_eq!(roster.team1.team_id, "lions");
        assert_eq!(roster.team1.players.len(), 1);
        assert_eq!(roster.team2.players[0].user_id, "p2");
        assert_eq!(roster.unassigned[0].user_id, "p3");
    }

    #[tokio::test]
    async fn score_update_reaches_spectators() {
        let (state, _store) = memory_state();
        let scorer = user("scorer");
        let created = create_match(&state, &scorer, cricket_request()).await.unwrap();
        let mut receiver = state.match_hubs().subscribe(&created.id);

        update_score(
            &state,
            &scorer,
            &created.id,
            ScoreUpdateRequest {
                team1_score: Some(cricket(6, 0, "0.1")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, sse_events::EVENT_MATCH_UPDATED);
        assert!(event.data.contains("\"runs\":6"));
    }
}
