use indexmap::IndexMap;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{
    BookingEntity, BookingStatus, InvitationEntity, InvitationKind, InvitationStatus,
    MatchEntity, MatchStatus, NotificationEntity, NotificationKind, NotificationStatus,
    ParticipantEntity, Sport, TeamMemberEntity, TeamScore, TeamSide,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoParticipantDocument {
    user_id: String,
    name: String,
    team: Option<TeamSide>,
    joined_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoMatchDocument {
    id: String,
    sport: Sport,
    status: MatchStatus,
    team1_id: String,
    team2_id: String,
    team1_name: String,
    team2_name: String,
    team1_score: Option<TeamScore>,
    team2_score: Option<TeamScore>,
    #[serde(default)]
    match_data: IndexMap<String, Value>,
    #[serde(default)]
    participants: Vec<MongoParticipantDocument>,
    created_by: String,
    venue_id: Option<String>,
    scheduled_at: Option<DateTime>,
    created_at: DateTime,
    updated_at: DateTime,
    version: i64,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            team: value.team,
            joined_at: DateTime::from_system_time(value.joined_at),
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            team: value.team,
            joined_at: value.joined_at.to_system_time(),
        }
    }
}

impl From<MatchEntity> for MongoMatchDocument {
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
            scheduled_at: value.scheduled_at.map(DateTime::from_system_time),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            version: value.version as i64,
        }
    }
}

impl From<MongoMatchDocument> for MatchEntity {
    fn from(value: MongoMatchDocument) -> Self {
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
            scheduled_at: value.scheduled_at.map(|at| at.to_system_time()),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            version: value.version.max(0) as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoNotificationDocument {
    id: String,
    recipient_user_id: String,
    sender_user_id: String,
    sender_name: String,
    sender_email: Option<String>,
    sender_phone: Option<String>,
    #[serde(rename = "type")]
    kind: NotificationKind,
    status: NotificationStatus,
    booking_id: Option<String>,
    match_type: Option<String>,
    location: Option<String>,
    message: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<NotificationEntity> for MongoNotificationDocument {
    fn from(value: NotificationEntity) -> Self {
        Self {
            id: value.id,
            recipient_user_id: value.recipient_user_id,
            sender_user_id: value.sender_user_id,
            sender_name: value.sender_name,
            sender_email: value.sender_email,
            sender_phone: value.sender_phone,
            kind: value.kind,
            status: value.status,
            booking_id: value.booking_id,
            match_type: value.match_type,
            location: value.location,
            message: value.message,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoNotificationDocument> for NotificationEntity {
    fn from(value: MongoNotificationDocument) -> Self {
        Self {
            id: value.id,
            recipient_user_id: value.recipient_user_id,
            sender_user_id: value.sender_user_id,
            sender_name: value.sender_name,
            sender_email: value.sender_email,
            sender_phone: value.sender_phone,
            kind: value.kind,
            status: value.status,
            booking_id: value.booking_id,
            match_type: value.match_type,
            location: value.location,
            message: value.message,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoInvitationDocument {
    id: String,
    email: String,
    invitation_type: InvitationKind,
    match_id: Option<String>,
    team_id: Option<String>,
    status: InvitationStatus,
    token: String,
    invited_by: String,
    expires_at: DateTime,
    accepted_by: Option<String>,
    accepted_at: Option<DateTime>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<InvitationEntity> for MongoInvitationDocument {
    fn from(value: InvitationEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            invitation_type: value.kind,
            match_id: value.match_id,
            team_id: value.team_id,
            status: value.status,
            token: value.token,
            invited_by: value.invited_by,
            expires_at: DateTime::from_system_time(value.expires_at),
            accepted_by: value.accepted_by,
            accepted_at: value.accepted_at.map(DateTime::from_system_time),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoInvitationDocument> for InvitationEntity {
    fn from(value: MongoInvitationDocument) -> Self {
        Self {
            id: value.id,
            email: value.email,
            kind: value.invitation_type,
            match_id: value.match_id,
            team_id: value.team_id,
            status: value.status,
            token: value.token,
            invited_by: value.invited_by,
            expires_at: value.expires_at.to_system_time(),
            accepted_by: value.accepted_by,
            accepted_at: value.accepted_at.map(|at| at.to_system_time()),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoBookingDocument {
    id: String,
    user_id: String,
    venue_id: String,
    venue_owner_id: String,
    starts_at: DateTime,
    ends_at: DateTime,
    status: BookingStatus,
    location: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<BookingEntity> for MongoBookingDocument {
    fn from(value: BookingEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            venue_id: value.venue_id,
            venue_owner_id: value.venue_owner_id,
            starts_at: DateTime::from_system_time(value.starts_at),
            ends_at: DateTime::from_system_time(value.ends_at),
            status: value.status,
            location: value.location,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoBookingDocument> for BookingEntity {
    fn from(value: MongoBookingDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            venue_id: value.venue_id,
            venue_owner_id: value.venue_owner_id,
            starts_at: value.starts_at.to_system_time(),
            ends_at: value.ends_at.to_system_time(),
            status: value.status,
            location: value.location,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoTeamMemberDocument {
    pub team_id: String,
    pub user_id: String,
    role: String,
    joined_at: DateTime,
}

impl From<TeamMemberEntity> for MongoTeamMemberDocument {
    fn from(value: TeamMemberEntity) -> Self {
        Self {
            team_id: value.team_id,
            user_id: value.user_id,
            role: value.role,
            joined_at: DateTime::from_system_time(value.joined_at),
        }
    }
}
