use std::{sync::Arc, time::SystemTime};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{BookingEntity, BookingStatus, NotificationKind},
        store::PlaykersStore,
    },
    dto::{
        bookings::{BookingResponse, CreateBookingRequest},
        parse_timestamp,
    },
    error::ServiceError,
    identity::CurrentUser,
    services::notification_service::{self, NewNotification},
    state::SharedState,
};

/// Reserve a venue slot and notify the venue owner.
///
/// The booking and the owner's notification are written independently; a failed
/// notification is logged and the booking is still returned.
pub async fn create_booking(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateBookingRequest,
) -> Result<BookingResponse, ServiceError> {
    let store = state.require_store().await?;

    let starts_at = parse_timestamp(&request.starts_at)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid startsAt: {err}")))?;
    let ends_at = parse_timestamp(&request.ends_at)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid endsAt: {err}")))?;
    if starts_at >= ends_at {
        return Err(ServiceError::InvalidInput(
            "startsAt must be before endsAt".into(),
        ));
    }

    ensure_slot_free(&store, &request.venue_id, None, starts_at, ends_at).await?;

    let now = SystemTime::now();
    let booking = BookingEntity {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        venue_id: request.venue_id,
        venue_owner_id: request.venue_owner_id,
        starts_at,
        ends_at,
        status: BookingStatus::Pending,
        location: request.location,
        created_at: now,
        updated_at: now,
    };
    store.insert_booking(booking.clone()).await?;
    info!(booking_id = %booking.id, venue_id = %booking.venue_id, user_id = %user.id, "booking requested");

    let notification = NewNotification {
        recipient_user_id: booking.venue_owner_id.clone(),
        kind: NotificationKind::BookingRequest,
        booking_id: Some(booking.id.clone()),
        location: booking.location.clone(),
        message: Some(format!("{} requested a booking", user.display_name())),
        ..NewNotification::from_sender(user)
    };
    if let Err(err) = notification_service::insert(&store, notification).await {
        warn!(booking_id = %booking.id, error = %err, "failed to notify venue owner about booking");
    }

    Ok(booking.into())
}

pub async fn list_bookings(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<Vec<BookingResponse>, ServiceError> {
    let store = state.require_store().await?;
    let bookings = store.list_bookings(user.id.clone()).await?;
    Ok(bookings.into_iter().map(Into::into).collect())
}

/// Fail with a conflict when a confirmed booking at `venue_id` overlaps the slot.
pub(crate) async fn ensure_slot_free(
    store: &Arc<dyn PlaykersStore>,
    venue_id: &str,
    exclude: Option<&str>,
    starts_at: SystemTime,
    ends_at: SystemTime,
) -> Result<(), ServiceError> {
    let confirmed = store
        .list_venue_bookings(venue_id.to_owned(), BookingStatus::Confirmed)
        .await?;
    let clash = confirmed
        .iter()
        .filter(|booking| Some(booking.id.as_str()) != exclude)
        .find(|booking| booking.overlaps(starts_at, ends_at));

    match clash {
        Some(existing) => Err(ServiceError::InvalidState(format!(
            "venue `{venue_id}` is already booked for that slot (booking `{}`)",
            existing.id
        ))),
        None => Ok(()),
    }
}

/// Move a pending booking to confirmed. Returns `None` when the booking was no longer
/// pending at write time.
pub(crate) async fn confirm(
    store: &Arc<dyn PlaykersStore>,
    booking: &BookingEntity,
) -> Result<Option<BookingEntity>, ServiceError> {
    let mut confirmed = booking.clone();
    confirmed.status = BookingStatus::Confirmed;
    confirmed.updated_at = SystemTime::now();

    if store
        .replace_booking(confirmed.clone(), BookingStatus::Pending)
        .await?
    {
        Ok(Some(confirmed))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::NotificationStatus,
        services::test_support::{memory_state, user},
    };

    fn request(starts_at: &str, ends_at: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            venue_id: "arena".into(),
            venue_owner_id: "owner".into(),
            starts_at: starts_at.into(),
            ends_at: ends_at.into(),
            location: Some("Court 2".into()),
        }
    }

    #[tokio::test]
    async fn booking_notifies_venue_owner() {
        let (state, _store) = memory_state();
        let booking = create_booking(
            &state,
            &user("player"),
            request("2026-06-01T10:00:00Z", "2026-06-01T11:00:00Z"),
        )
        .await
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let store = state.require_store().await.unwrap();
        let inbox = store
            .list_notifications("owner".into(), Some(NotificationStatus::Unread))
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::BookingRequest);
        assert_eq!(inbox[0].booking_id.as_deref(), Some(booking.id.as_str()));
        assert_eq!(inbox[0].sender_user_id, "player");
    }

    #[tokio::test]
    async fn inverted_slot_is_rejected() {
        let (state, _store) = memory_state();
        let err = create_booking(
            &state,
            &user("player"),
            request("2026-06-01T11:00:00Z", "2026-06-01T10:00:00Z"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn overlapping_confirmed_booking_conflicts() {
        let (state, _store) = memory_state();
        let first = create_booking(
            &state,
            &user("player"),
            request("2026-06-01T10:00:00Z", "2026-06-01T11:00:00Z"),
        )
        .await
        .unwrap();

        let store = state.require_store().await.unwrap();
        let pending = store.find_booking(first.id.clone()).await.unwrap().unwrap();
        confirm(&store, &pending).await.unwrap().unwrap();

        let err = create_booking(
            &state,
            &user("rival"),
            request("2026-06-01T10:30:00Z", "2026-06-01T11:30:00Z"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        create_booking(
            &state,
            &user("rival"),
            request("2026-06-01T11:00:00Z", "2026-06-01T12:00:00Z"),
        )
        .await
        .unwrap();
        assert_eq!(list_bookings(&state, &user("rival")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirm_only_applies_to_pending_bookings() {
        let (state, _store) = memory_state();
        let created = create_booking(
            &state,
            &user("player"),
            request("2026-06-02T10:00:00Z", "2026-06-02T11:00:00Z"),
        )
        .await
        .unwrap();
        let store = state.require_store().await.unwrap();
        let pending = store.find_booking(created.id).await.unwrap().unwrap();

        assert!(confirm(&store, &pending).await.unwrap().is_some());
        assert!(confirm(&store, &pending).await.unwrap().is_none());
    }
}
