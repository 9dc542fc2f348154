//! Notification inbox: creation, listing, status changes and the accept flows for
//! match and booking requests.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{
            BookingEntity, BookingStatus, NotificationEntity, NotificationKind,
            NotificationStatus,
        },
        store::PlaykersStore,
    },
    dto::notifications::{
        AcceptBookingResponse, AcceptNotificationResponse, CreateNotificationRequest,
        NotificationResponse, SenderContact, UnreadCountResponse, invalidated_queries,
    },
    error::ServiceError,
    identity::CurrentUser,
    services::booking_service,
    state::{
        SharedState,
        lifecycle::{StatusChange, plan_notification_status},
    },
};

/// Attempts made when the stored status moves between read and write.
const STATUS_WRITE_ATTEMPTS: u32 = 3;

/// Notification about to be stored; the sender fields come from the caller.
pub(crate) struct NewNotification {
    pub recipient_user_id: String,
    pub sender_user_id: String,
    pub sender_name: String,
    pub sender_email: Option<String>,
    pub sender_phone: Option<String>,
    pub kind: NotificationKind,
    pub booking_id: Option<String>,
    pub match_type: Option<String>,
    pub location: Option<String>,
    pub message: Option<String>,
}

impl NewNotification {
    /// Match request from `user`; callers override the recipient and kind.
    pub(crate) fn from_sender(user: &CurrentUser) -> Self {
        Self {
            recipient_user_id: String::new(),
            sender_user_id: user.id.clone(),
            sender_name: user.display_name().to_owned(),
            sender_email: None,
            sender_phone: None,
            kind: NotificationKind::MatchRequest,
            booking_id: None,
            match_type: None,
            location: None,
            message: None,
        }
    }
}

/// Store an unread notification.
pub(crate) async fn insert(
    store: &Arc<dyn PlaykersStore>,
    new: NewNotification,
) -> Result<NotificationEntity, ServiceError> {
    let now = SystemTime::now();
    let entity = NotificationEntity {
        id: Uuid::new_v4().to_string(),
        recipient_user_id: new.recipient_user_id,
        sender_user_id: new.sender_user_id,
        sender_name: new.sender_name,
        sender_email: new.sender_email,
        sender_phone: new.sender_phone,
        kind: new.kind,
        status: NotificationStatus::Unread,
        booking_id: new.booking_id,
        match_type: new.match_type,
        location: new.location,
        message: new.message,
        created_at: now,
        updated_at: now,
    };
    store.insert_notification(entity.clone()).await?;
    debug!(
        notification_id = %entity.id,
        recipient = %entity.recipient_user_id,
        kind = entity.kind.as_str(),
        "notification stored"
    );
    Ok(entity)
}

pub async fn create_notification(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateNotificationRequest,
) -> Result<NotificationResponse, ServiceError> {
    if request.recipient_user_id == user.id {
        return Err(ServiceError::InvalidInput(
            "cannot send a request to yourself".into(),
        ));
    }
    if request.kind != NotificationKind::MatchRequest {
        return Err(ServiceError::InvalidInput(format!(
            "`{}` notifications are created by the booking flow",
            request.kind.as_str()
        )));
    }

    let store = state.require_store().await?;
    let new = NewNotification {
        recipient_user_id: request.recipient_user_id,
        sender_email: request.sender_email,
        sender_phone: request.sender_phone,
        kind: request.kind,
        booking_id: request.booking_id,
        match_type: request.match_type,
        location: request.location,
        message: request.message,
        ..NewNotification::from_sender(user)
    };
    Ok(insert(&store, new).await?.into())
}

/// Caller's notifications, newest first.
pub async fn list_notifications(
    state: &SharedState,
    user: &CurrentUser,
    status: Option<NotificationStatus>,
) -> Result<Vec<NotificationResponse>, ServiceError> {
    let store = state.require_store().await?;
    let notifications = store.list_notifications(user.id.clone(), status).await?;
    Ok(notifications.into_iter().map(Into::into).collect())
}

pub async fn unread_count(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<UnreadCountResponse, ServiceError> {
    let store = state.require_store().await?;
    let count = store
        .count_notifications(user.id.clone(), NotificationStatus::Unread)
        .await?;
    Ok(UnreadCountResponse { count })
}

/// Change the status of one of the caller's notifications.
pub async fn update_status(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
    status: NotificationStatus,
) -> Result<NotificationResponse, ServiceError> {
    let store = state.require_store().await?;
    let (entity, _) = change_status(&store, user, id, status).await?;
    Ok(entity.into())
}

pub async fn decline(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<NotificationResponse, ServiceError> {
    update_status(state, user, id, NotificationStatus::Declined).await
}

/// Accept a match request and hand back the sender's contact plus a pre-filled
/// match creation link.
pub async fn accept(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<AcceptNotificationResponse, ServiceError> {
    let store = state.require_store().await?;
    let current = load_for_recipient(&store, user, id).await?;
    match current.kind {
        NotificationKind::MatchRequest => {}
        NotificationKind::BookingRequest => {
            return Err(ServiceError::InvalidInput(
                "booking requests are accepted through accept-booking".into(),
            ));
        }
        NotificationKind::BookingAccepted => {
            return Err(ServiceError::InvalidInput(
                "booking confirmations cannot be accepted".into(),
            ));
        }
    }

    let (entity, changed) =
        change_status(&store, user, id, NotificationStatus::Accepted).await?;
    if changed {
        info!(notification_id = %entity.id, sender = %entity.sender_user_id, "match request accepted");
    }

    Ok(AcceptNotificationResponse {
        sender: SenderContact::from(&entity),
        redirect: Some(create_match_redirect(&entity)),
        invalidate: invalidated_queries(),
        notification: entity.into(),
    })
}

/// Accept a booking request: confirm the booking and tell the requester.
///
/// The three writes are independent. Once the notification is accepted, failures of
/// the follow-up writes are logged and surfaced as `partial`.
pub async fn accept_booking(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<AcceptBookingResponse, ServiceError> {
    let store = state.require_store().await?;
    let current = load_for_recipient(&store, user, id).await?;
    if current.kind != NotificationKind::BookingRequest {
        return Err(ServiceError::InvalidInput(format!(
            "notification `{id}` is not a booking request"
        )));
    }
    let booking_id = current.booking_id.clone().ok_or_else(|| {
        ServiceError::InvalidInput(format!("notification `{id}` does not reference a booking"))
    })?;
    let booking = store
        .find_booking(booking_id.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("booking `{booking_id}` not found")))?;
    if booking.venue_owner_id != user.id {
        warn!(booking_id = %booking_id, user_id = %user.id, "booking accept attempted by non-owner");
        return Err(ServiceError::Forbidden(format!(
            "only the venue owner can accept booking `{booking_id}`"
        )));
    }

    if booking.status == BookingStatus::Pending {
        booking_service::ensure_slot_free(
            &store,
            &booking.venue_id,
            Some(&booking.id),
            booking.starts_at,
            booking.ends_at,
        )
        .await?;
    }

    let (notification, _) =
        change_status(&store, user, id, NotificationStatus::Accepted).await?;

    let mut warnings = Vec::new();
    let confirmed = match booking.status {
        BookingStatus::Confirmed => Some(booking.clone()),
        BookingStatus::Cancelled => {
            warnings.push(format!("booking `{booking_id}` was cancelled"));
            None
        }
        BookingStatus::Pending => match booking_service::confirm(&store, &booking).await {
            Ok(Some(confirmed)) => {
                info!(booking_id = %confirmed.id, owner = %user.id, "booking confirmed");
                notify_requester(&store, user, &confirmed, &mut warnings).await;
                Some(confirmed)
            }
            Ok(None) => {
                warn!(booking_id = %booking_id, "booking changed before confirmation");
                warnings.push(format!("booking `{booking_id}` changed before confirmation"));
                None
            }
            Err(err) => {
                warn!(booking_id = %booking_id, error = %err, "failed to confirm booking");
                warnings.push(format!("failed to confirm booking `{booking_id}`"));
                None
            }
        },
    };

    Ok(AcceptBookingResponse {
        notification: notification.into(),
        booking: confirmed.map(Into::into),
        partial: !warnings.is_empty(),
        warnings,
        invalidate: invalidated_queries(),
    })
}

async fn notify_requester(
    store: &Arc<dyn PlaykersStore>,
    owner: &CurrentUser,
    booking: &BookingEntity,
    warnings: &mut Vec<String>,
) {
    let new = NewNotification {
        recipient_user_id: booking.user_id.clone(),
        kind: NotificationKind::BookingAccepted,
        booking_id: Some(booking.id.clone()),
        location: booking.location.clone(),
        message: Some(format!("{} accepted your booking", owner.display_name())),
        ..NewNotification::from_sender(owner)
    };
    if let Err(err) = insert(store, new).await {
        warn!(booking_id = %booking.id, error = %err, "failed to notify requester about confirmed booking");
        warnings.push("requester could not be notified".into());
    }
}

/// Delete one of the caller's notifications.
pub async fn delete_notification(
    state: &SharedState,
    user: &CurrentUser,
    id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    load_for_recipient(&store, user, id).await?;
    if !store.delete_notification(id.to_owned()).await? {
        return Err(not_found(id));
    }
    Ok(())
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("notification `{id}` not found"))
}

async fn load_for_recipient(
    store: &Arc<dyn PlaykersStore>,
    user: &CurrentUser,
    id: &str,
) -> Result<NotificationEntity, ServiceError> {
    let entity = store
        .find_notification(id.to_owned())
        .await?
        .ok_or_else(|| not_found(id))?;
    if entity.recipient_user_id != user.id {
        return Err(ServiceError::Forbidden(format!(
            "notification `{id}` belongs to another user"
        )));
    }
    Ok(entity)
}

/// Apply the status table with a write conditioned on the status that was read.
/// Returns the resulting entity and whether a write happened.
async fn change_status(
    store: &Arc<dyn PlaykersStore>,
    user: &CurrentUser,
    id: &str,
    status: NotificationStatus,
) -> Result<(NotificationEntity, bool), ServiceError> {
    for _ in 0..STATUS_WRITE_ATTEMPTS {
        let current = load_for_recipient(store, user, id).await?;
        let next = match plan_notification_status(current.status, status)? {
            StatusChange::Unchanged => return Ok((current, false)),
            StatusChange::Transition(next) => next,
        };

        let previous = current.status;
        let mut updated = current;
        updated.status = next;
        updated.updated_at = SystemTime::now();
        if store
            .replace_notification(updated.clone(), previous)
            .await?
        {
            return Ok((updated, true));
        }
        debug!(notification_id = %id, "notification changed concurrently; retrying");
    }

    Err(ServiceError::InvalidState(format!(
        "notification `{id}` was modified concurrently"
    )))
}

fn create_match_redirect(entity: &NotificationEntity) -> String {
    let mut query = vec![format!(
        "opponentId={}",
        urlencoding::encode(&entity.sender_user_id)
    )];
    if let Some(match_type) = &entity.match_type {
        query.push(format!("matchType={}", urlencoding::encode(match_type)));
    }
    if let Some(location) = &entity.location {
        query.push(format!("location={}", urlencoding::encode(location)));
    }
    format!("/create-match?{}", query.join("&"))
}
