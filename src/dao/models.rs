use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Sports a match can be organised for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Cricket,
    Football,
    Volleyball,
    Tennis,
    Kabaddi,
}

impl Sport {
    /// Stable lowercase name used in storage filters and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Football => "football",
            Sport::Volleyball => "volleyball",
            Sport::Tennis => "tennis",
            Sport::Kabaddi => "kabaddi",
        }
    }
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Paused,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Paused => "paused",
            MatchStatus::Completed => "completed",
        }
    }
}

/// Which side of a match a participant plays for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::Team1 => "team1",
            TeamSide::Team2 => "team2",
        }
    }
}

/// Cricket innings score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CricketScore {
    pub runs: u32,
    pub wickets: u8,
    /// Overs bowled, written as `"<overs>.<balls>"` (e.g. `"15.2"`).
    pub overs: String,
}

/// Score of one side. Cricket carries a structured innings score, every other sport a
/// plain points tally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(untagged)]
pub enum TeamScore {
    Cricket(CricketScore),
    Points(u32),
}

/// Player attached to a match, usually through an accepted invitation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEntity {
    pub user_id: String,
    pub name: String,
    pub team: Option<TeamSide>,
    pub joined_at: SystemTime,
}

/// Match document shared by the scorer and every spectator.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEntity {
    /// Application generated identifier (not the native document id).
    pub id: String,
    pub sport: Sport,
    pub status: MatchStatus,
    pub team1_id: String,
    pub team2_id: String,
    pub team1_name: String,
    pub team2_name: String,
    pub team1_score: Option<TeamScore>,
    pub team2_score: Option<TeamScore>,
    /// Untyped bag holding toss, current players, innings, awards and the result summary.
    pub match_data: IndexMap<String, Value>,
    pub participants: Vec<ParticipantEntity>,
    pub created_by: String,
    pub venue_id: Option<String>,
    pub scheduled_at: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Incremented on every successful write; used for compare-and-set replacement.
    pub version: u64,
}

impl MatchEntity {
    /// Identifier of the team playing on `side`.
    pub fn team_id(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Team1 => &self.team1_id,
            TeamSide::Team2 => &self.team2_id,
        }
    }

    /// Display name of the team playing on `side`.
    pub fn team_name(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Team1 => &self.team1_name,
            TeamSide::Team2 => &self.team2_name,
        }
    }

    /// Score of the team playing on `side`, if scoring has started.
    pub fn score(&self, side: TeamSide) -> Option<&TeamScore> {
        match side {
            TeamSide::Team1 => self.team1_score.as_ref(),
            TeamSide::Team2 => self.team2_score.as_ref(),
        }
    }
}

/// Optional filters applied when listing matches.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub sport: Option<Sport>,
}

/// Kind of inbound request a notification represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchRequest,
    BookingRequest,
    BookingAccepted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::MatchRequest => "match_request",
            NotificationKind::BookingRequest => "booking_request",
            NotificationKind::BookingAccepted => "booking_accepted",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Unread,
    Read,
    Accepted,
    Declined,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
            NotificationStatus::Accepted => "accepted",
            NotificationStatus::Declined => "declined",
        }
    }
}

/// Notification addressed to a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEntity {
    pub id: String,
    pub recipient_user_id: String,
    pub sender_user_id: String,
    pub sender_name: String,
    pub sender_email: Option<String>,
    pub sender_phone: Option<String>,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub booking_id: Option<String>,
    pub match_type: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvitationKind {
    Match,
    Team,
}

impl InvitationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationKind::Match => "match",
            InvitationKind::Team => "team",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

/// Email-addressed invitation redeemable once through its bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationEntity {
    pub id: String,
    pub email: String,
    pub kind: InvitationKind,
    pub match_id: Option<String>,
    pub team_id: Option<String>,
    pub status: InvitationStatus,
    pub token: String,
    pub invited_by: String,
    pub expires_at: SystemTime,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Venue reservation requested by a user and confirmed by the venue owner.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingEntity {
    pub id: String,
    pub user_id: String,
    pub venue_id: String,
    pub venue_owner_id: String,
    pub starts_at: SystemTime,
    pub ends_at: SystemTime,
    pub status: BookingStatus,
    pub location: Option<String>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl BookingEntity {
    /// Whether the two half-open time ranges intersect.
    pub fn overlaps(&self, starts_at: SystemTime, ends_at: SystemTime) -> bool {
        self.starts_at < ends_at && starts_at < self.ends_at
    }
}

/// Membership row written when a team invitation is redeemed.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMemberEntity {
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn team_score_deserializes_both_shapes() {
        let cricket: TeamScore =
            serde_json::from_str(r#"{"runs":120,"wickets":3,"overs":"15.2"}"#).unwrap();
        assert_eq!(
            cricket,
            TeamScore::Cricket(CricketScore {
                runs: 120,
                wickets: 3,
                overs: "15.2".into(),
            })
        );

        let points: TeamScore = serde_json::from_str("21").unwrap();
        assert_eq!(points, TeamScore::Points(21));
    }

    #[test]
    fn negative_points_are_rejected() {
        assert!(serde_json::from_str::<TeamScore>("-1").is_err());
    }

    #[test]
    fn booking_overlap_is_half_open() {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let booking = BookingEntity {
            id: "b1".into(),
            user_id: "u1".into(),
            venue_id: "v1".into(),
            venue_owner_id: "owner".into(),
            starts_at: base,
            ends_at: base + Duration::from_secs(3600),
            status: BookingStatus::Confirmed,
            location: None,
            created_at: base,
            updated_at: base,
        };

        assert!(booking.overlaps(
            base + Duration::from_secs(1800),
            base + Duration::from_secs(5400)
        ));
        assert!(!booking.overlaps(
            base + Duration::from_secs(3600),
            base + Duration::from_secs(7200)
        ));
        assert!(!booking.overlaps(base - Duration::from_secs(3600), base));
    }
}
