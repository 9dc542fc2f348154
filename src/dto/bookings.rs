use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{BookingEntity, BookingStatus},
    dto::{format_system_time, validation::validate_not_blank},
};

/// Payload used to reserve a venue slot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub venue_id: String,
    /// Owner who receives the booking request notification.
    #[validate(custom(function = "validate_not_blank"))]
    pub venue_owner_id: String,
    /// RFC 3339 start of the slot (inclusive).
    pub starts_at: String,
    /// RFC 3339 end of the slot (exclusive).
    pub ends_at: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub venue_id: String,
    pub venue_owner_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub status: BookingStatus,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BookingEntity> for BookingResponse {
    fn from(value: BookingEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            venue_id: value.venue_id,
            venue_owner_id: value.venue_owner_id,
            starts_at: format_system_time(value.starts_at),
            ends_at: format_system_time(value.ends_at),
            status: value.status,
            location: value.location,
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}
