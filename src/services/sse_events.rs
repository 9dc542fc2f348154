use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::MatchEntity,
    dto::{
        matches::{MatchResponse, ParticipantsResponse},
        sse::{MatchStatusEvent, ServerEvent},
    },
    state::SharedState,
};

pub const EVENT_MATCH_UPDATED: &str = "match.updated";
pub const EVENT_MATCH_STATUS: &str = "match.status";
pub const EVENT_MATCH_COMPLETED: &str = "match.completed";
pub const EVENT_MATCH_PARTICIPANTS: &str = "match.participants";
/// Name of the first event every spectator stream receives.
pub const EVENT_MATCH_SNAPSHOT: &str = "match.snapshot";

/// Broadcast the full match after a score update.
pub fn broadcast_match_updated(state: &SharedState, entity: &MatchEntity) {
    let payload = MatchResponse::from(entity.clone());
    send_match_event(state, &entity.id, EVENT_MATCH_UPDATED, &payload);
}

/// Broadcast a lifecycle change (start, pause, resume).
pub fn broadcast_match_status(state: &SharedState, entity: &MatchEntity) {
    let payload = MatchStatusEvent {
        match_id: entity.id.clone(),
        status: entity.status,
        version: entity.version,
    };
    send_match_event(state, &entity.id, EVENT_MATCH_STATUS, &payload);
}

/// Broadcast the final match, result summary included.
pub fn broadcast_match_completed(state: &SharedState, entity: &MatchEntity) {
    let payload = MatchResponse::from(entity.clone());
    send_match_event(state, &entity.id, EVENT_MATCH_COMPLETED, &payload);
}

/// Broadcast the participant list after someone joined.
pub fn broadcast_participants(state: &SharedState, entity: &MatchEntity) {
    let payload = ParticipantsResponse {
        match_id: entity.id.clone(),
        participants: entity.participants.iter().cloned().map(Into::into).collect(),
    };
    send_match_event(state, &entity.id, EVENT_MATCH_PARTICIPANTS, &payload);
}

/// Serialise the snapshot sent when a spectator connects.
pub fn snapshot_event(entity: MatchEntity) -> Option<ServerEvent> {
    let payload = MatchResponse::from(entity);
    match ServerEvent::json(EVENT_MATCH_SNAPSHOT, &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(match_id = %payload.id, error = %err, "failed to serialize match snapshot");
            None
        }
    }
}

fn send_match_event(
    state: &SharedState,
    match_id: &str,
    event: &'static str,
    payload: &impl Serialize,
) {
    match ServerEvent::json(event, payload) {
        Ok(event) => state.match_hubs().broadcast(match_id, event),
        Err(err) => warn!(match_id, event, error = %err, "failed to serialize match SSE payload"),
    }
}
