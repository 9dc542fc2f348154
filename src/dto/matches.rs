use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, MatchStatus, ParticipantEntity, Sport, TeamScore, TeamSide},
    dto::{format_system_time, validation::validate_not_blank},
};

/// Payload used to schedule a new match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub sport: Sport,
    /// Identifier of the first team; generated when omitted.
    #[serde(default)]
    pub team1_id: Option<String>,
    #[serde(default)]
    pub team2_id: Option<String>,
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team1_name: String,
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub team2_name: String,
    #[serde(default)]
    pub venue_id: Option<String>,
    /// RFC 3339 start time.
    #[serde(default)]
    pub scheduled_at: Option<String>,
    /// Initial sport-specific data (toss, squads, format).
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub match_data: Option<IndexMap<String, Value>>,
}

/// Partial score update sent by the scorer.
///
/// Omitted scores are kept. `matchData` keys are merged into the stored bag and a key
/// set to `null` is removed.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateRequest {
    #[serde(default)]
    pub team1_score: Option<TeamScore>,
    #[serde(default)]
    pub team2_score: Option<TeamScore>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub match_data: Option<IndexMap<String, Value>>,
    /// When present the update only applies if the stored version still matches.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Query string accepted by the match listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MatchListQuery {
    pub status: Option<MatchStatus>,
    pub sport: Option<Sport>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Player attached to a match.
pub struct ParticipantResponse {
    pub user_id: String,
    pub name: String,
    pub team: Option<TeamSide>,
    pub joined_at: String,
}

impl From<ParticipantEntity> for ParticipantResponse {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            team: value.team,
            joined_at: format_system_time(value.joined_at),
        }
    }
}

/// Public projection of a match, shared by the scorer and spectators.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: String,
    pub sport: Sport,
    pub status: MatchStatus,
    pub team1_id: String,
    pub team2_id: String,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_score: Option<TeamScore>,
    pub team2_score: Option<TeamScore>,
    #[schema(value_type = Object)]
    pub match_data: IndexMap<String, Value>,
    pub participants: Vec<ParticipantResponse>,
    pub created_by: String,
    pub venue_id: Option<String>,
    pub scheduled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
}

impl From<MatchEntity> for MatchResponse {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id,
            sport: value.sport,
            status: value.status,
            team1_id: value.team1_id,
            team2_id: value.team2_id,
            team1_name: value.team1_name,
            team2_name: value.team2_name,
            team1_score: value.team1_score,
            team2_score: value.team2_score,
            match_data: value.match_data,
            participants: value.participants.into_iter().map(Into::into).collect(),
            created_by: value.created_by,
            venue_id: value.venue_id,
            scheduled_at: value.scheduled_at.map(format_system_time),
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
            version: value.version,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Participants list of a match.
pub struct ParticipantsResponse {
    pub match_id: String,
    pub participants: Vec<ParticipantResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Players fielded by one side.
pub struct RosterSide {
    pub team_id: String,
    pub team_name: String,
    pub players: Vec<ParticipantResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Participants grouped by side.
pub struct RosterResponse {
    pub match_id: String,
    pub team1: RosterSide,
    pub team2: RosterSide,
    pub unassigned: Vec<ParticipantResponse>,
}

impl From<MatchEntity> for RosterResponse {
    fn from(value: MatchEntity) -> Self {
        let mut team1 = Vec::new();
        let mut team2 = Vec::new();
        let mut unassigned = Vec::new();
        for participant in value.participants {
            let bucket = match participant.team {
                Some(TeamSide::Team1) => &mut team1,
                Some(TeamSide::Team2) => &mut team2,
                None => &mut unassigned,
            };
            bucket.push(participant.into());
        }

        Self {
            match_id: value.id,
            team1: RosterSide {
                team_id: value.team1_id,
                team_name: value.team1_name,
                players: team1,
            },
            team2: RosterSide {
                team_id: value.team2_id,
                team_name: value.team2_name,
                players: team2,
            },
            unassigned,
        }
    }
}

/// How a completed match was decided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResultType {
    WonByRuns,
    WonByWickets,
    Tie,
    Won,
    Draw,
}

/// Result stored under `matchData.resultSummary` when a match completes.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub result_type: ResultType,
    /// Winning team id; `null` for ties and draws.
    #[serialize_always]
    #[serde(default)]
    pub winner_id: Option<String>,
    #[serde(default)]
    pub margin_runs: Option<u32>,
    #[serde(default)]
    pub margin_wickets: Option<u8>,
    #[serde(default)]
    pub margin_points: Option<u32>,
    pub summary_text: String,
}
