use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{NotificationEntity, NotificationKind, NotificationStatus},
    dto::{bookings::BookingResponse, format_system_time, validation::validate_not_blank},
};

/// Query-key prefixes a client should drop after acting on a notification.
pub const INVALIDATED_QUERIES: [&str; 3] = ["notifications", "matches", "unread-count"];

/// Payload used to send a match or booking request to another user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub recipient_user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    #[validate(email)]
    pub sender_email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, max = 20))]
    pub sender_phone: Option<String>,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
/// Optional status filter for the notification list.
pub struct NotificationListQuery {
    pub status: Option<NotificationStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Explicit status change requested by the recipient.
pub struct UpdateNotificationStatusRequest {
    pub status: NotificationStatus,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Notification as shown in the dropdown.
pub struct NotificationResponse {
    pub id: String,
    pub recipient_user_id: String,
    pub sender_user_id: String,
    pub sender_name: String,
    pub sender_email: Option<String>,
    pub sender_phone: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub booking_id: Option<String>,
    pub match_type: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<NotificationEntity> for NotificationResponse {
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
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Number of unread notifications of the caller.
pub struct UnreadCountResponse {
    pub count: u64,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Contact details of whoever sent a request.
pub struct SenderContact {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&NotificationEntity> for SenderContact {
    fn from(value: &NotificationEntity) -> Self {
        Self {
            user_id: value.sender_user_id.clone(),
            name: value.sender_name.clone(),
            email: value.sender_email.clone(),
            phone: value.sender_phone.clone(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Result of accepting a match request.
pub struct AcceptNotificationResponse {
    pub notification: NotificationResponse,
    pub sender: SenderContact,
    /// Pre-filled match creation form the client navigates to.
    pub redirect: Option<String>,
    pub invalidate: Vec<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Result of accepting a booking request.
pub struct AcceptBookingResponse {
    pub notification: NotificationResponse,
    pub booking: Option<BookingResponse>,
    /// Set when a follow-up write failed after the notification was accepted.
    pub partial: bool,
    pub warnings: Vec<String>,
    pub invalidate: Vec<String>,
}

pub(crate) fn invalidated_queries() -> Vec<String> {
    INVALIDATED_QUERIES.iter().map(|key| key.to_string()).collect()
}
