use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::MatchStatus;

/// Named event fanned out to the spectators of one match.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub event: &'static str,
    /// JSON payload, serialised once for every subscriber.
    pub data: String,
}

impl ServerEvent {
    pub fn json<T: Serialize>(event: &'static str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            event,
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast whenever a match moves through its lifecycle.
pub struct MatchStatusEvent {
    pub match_id: String,
    pub status: MatchStatus,
    pub version: u64,
}
