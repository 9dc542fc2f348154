//! In-process store backed by concurrent maps, used for local development and tests.

use std::{cmp::Reverse, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, ready};

use crate::dao::{
    models::{
        BookingEntity, BookingStatus, InvitationEntity, InvitationStatus, MatchEntity,
        MatchFilter, NotificationEntity, NotificationStatus, TeamMemberEntity,
    },
    storage::{StorageError, StorageResult},
    store::PlaykersStore,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    matches: DashMap<String, MatchEntity>,
    notifications: DashMap<String, NotificationEntity>,
    invitations: DashMap<String, InvitationEntity>,
    bookings: DashMap<String, BookingEntity>,
    team_members: DashMap<(String, String), TeamMemberEntity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert_new<T>(
    map: &DashMap<String, T>,
    collection: &'static str,
    id: String,
    value: T,
) -> StorageResult<()> {
    match map.entry(id) {
        Entry::Occupied(entry) => Err(StorageError::Duplicate {
            collection,
            id: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

/// Replace the stored value only when `matches` accepts the current one.
fn compare_and_replace<T>(
    map: &DashMap<String, T>,
    id: &str,
    value: T,
    matches: impl FnOnce(&T) -> bool,
) -> bool {
    let Some(mut current) = map.get_mut(id) else {
        return false;
    };
    if !matches(&*current) {
        return false;
    }
    *current = value;
    true
}

impl PlaykersStore for MemoryStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let id = entity.id.clone();
        Box::pin(ready(insert_new(&self.inner.matches, "matches", id, entity)))
    }

    fn find_match(&self, id: String) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let found = self.inner.matches.get(&id).map(|entry| entry.clone());
        Box::pin(ready(Ok(found)))
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let mut matches: Vec<MatchEntity> = self
            .inner
            .matches
            .iter()
            .filter(|entry| filter.status.is_none_or(|status| entry.status == status))
            .filter(|entry| filter.sport.is_none_or(|sport| entry.sport == sport))
            .map(|entry| entry.clone())
            .collect();
        matches.sort_by_key(|entity| Reverse(entity.created_at));
        Box::pin(ready(Ok(matches)))
    }

    fn replace_match(
        &self,
        entity: MatchEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let id = entity.id.clone();
        let replaced = compare_and_replace(&self.inner.matches, &id, entity, |current| {
            current.version == expected_version
        });
        Box::pin(ready(Ok(replaced)))
    }

    fn insert_notification(
        &self,
        entity: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let id = entity.id.clone();
        Box::pin(ready(insert_new(
            &self.inner.notifications,
            "notifications",
            id,
            entity,
        )))
    }

    fn find_notification(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        let found = self.inner.notifications.get(&id).map(|entry| entry.clone());
        Box::pin(ready(Ok(found)))
    }

    fn list_notifications(
        &self,
        recipient_user_id: String,
        status: Option<NotificationStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>> {
        let mut notifications: Vec<NotificationEntity> = self
            .inner
            .notifications
            .iter()
            .filter(|entry| entry.recipient_user_id == recipient_user_id)
            .filter(|entry| status.is_none_or(|status| entry.status == status))
            .map(|entry| entry.clone())
            .collect();
        notifications.sort_by_key(|entity| Reverse(entity.created_at));
        Box::pin(ready(Ok(notifications)))
    }

    fn count_notifications(
        &self,
        recipient_user_id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let count = self
            .inner
            .notifications
            .iter()
            .filter(|entry| entry.recipient_user_id == recipient_user_id && entry.status == status)
            .count() as u64;
        Box::pin(ready(Ok(count)))
    }

    fn replace_notification(
        &self,
        entity: NotificationEntity,
        expected_status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let id = entity.id.clone();
        let replaced = compare_and_replace(&self.inner.notifications, &id, entity, |current| {
            current.status == expected_status
        });
        Box::pin(ready(Ok(replaced)))
    }

    fn delete_notification(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let deleted = self.inner.notifications.remove(&id).is_some();
        Box::pin(ready(Ok(deleted)))
    }

    fn insert_invitation(
        &self,
        entity: InvitationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let id = entity.id.clone();
        Box::pin(ready(insert_new(
            &self.inner.invitations,
            "invitations",
            id,
            entity,
        )))
    }

    fn find_invitation(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>> {
        let found = self.inner.invitations.get(&id).map(|entry| entry.clone());
        Box::pin(ready(Ok(found)))
    }

    fn find_invitation_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>> {
        let found = self
            .inner
            .invitations
            .iter()
            .find(|entry| entry.token == token)
            .map(|entry| entry.clone());
        Box::pin(ready(Ok(found)))
    }

    fn list_invitations(
        &self,
        invited_by: String,
    ) -> BoxFuture<'static, StorageResult<Vec<InvitationEntity>>> {
        let mut invitations: Vec<InvitationEntity> = self
            .inner
            .invitations
            .iter()
            .filter(|entry| entry.invited_by == invited_by)
            .map(|entry| entry.clone())
            .collect();
        invitations.sort_by_key(|entity| Reverse(entity.created_at));
        Box::pin(ready(Ok(invitations)))
    }

    fn replace_invitation(
        &self,
        entity: InvitationEntity,
        expected_status: InvitationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let id = entity.id.clone();
        let replaced = compare_and_replace(&self.inner.invitations, &id, entity, |current| {
            current.status == expected_status
        });
        Box::pin(ready(Ok(replaced)))
    }

    fn insert_booking(&self, entity: BookingEntity) -> BoxFuture<'static, StorageResult<()>> {
        let id = entity.id.clone();
        Box::pin(ready(insert_new(&self.inner.bookings, "bookings", id, entity)))
    }

    fn find_booking(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<BookingEntity>>> {
        let found = self.inner.bookings.get(&id).map(|entry| entry.clone());
        Box::pin(ready(Ok(found)))
    }

    fn list_bookings(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let mut bookings: Vec<BookingEntity> = self
            .inner
            .bookings
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        bookings.sort_by_key(|entity| entity.starts_at);
        Box::pin(ready(Ok(bookings)))
    }

    fn list_venue_bookings(
        &self,
        venue_id: String,
        status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let mut bookings: Vec<BookingEntity> = self
            .inner
            .bookings
            .iter()
            .filter(|entry| entry.venue_id == venue_id && entry.status == status)
            .map(|entry| entry.clone())
            .collect();
        bookings.sort_by_key(|entity| entity.starts_at);
        Box::pin(ready(Ok(bookings)))
    }

    fn replace_booking(
        &self,
        entity: BookingEntity,
        expected_status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let id = entity.id.clone();
        let replaced = compare_and_replace(&self.inner.bookings, &id, entity, |current| {
            current.status == expected_status
        });
        Box::pin(ready(Ok(replaced)))
    }

    fn upsert_team_member(
        &self,
        member: TeamMemberEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let key = (member.team_id.clone(), member.user_id.clone());
        self.inner.team_members.insert(key, member);
        Box::pin(ready(Ok(())))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Team memberships recorded so far, for assertions.
    pub(crate) fn team_members(&self) -> Vec<TeamMemberEntity> {
        self.inner
            .team_members
            .iter()
            .map(|entry| entry.clone())
            .collect()
    }
}
