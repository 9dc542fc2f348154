pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{
    BookingEntity, BookingStatus, InvitationEntity, InvitationStatus, MatchEntity, MatchFilter,
    NotificationEntity, NotificationStatus, TeamMemberEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the document store holding matches, notifications, invitations,
/// bookings and team memberships.
///
/// Every `replace_*` method is a conditional write: it only succeeds while the stored
/// document still carries the expected version or status, and reports `false` otherwise.
pub trait PlaykersStore: Send + Sync {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_match(&self, id: String) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    fn list_matches(&self, filter: MatchFilter)
    -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    fn replace_match(
        &self,
        entity: MatchEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_notification(
        &self,
        entity: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_notification(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>>;
    fn list_notifications(
        &self,
        recipient_user_id: String,
        status: Option<NotificationStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>>;
    fn count_notifications(
        &self,
        recipient_user_id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    fn replace_notification(
        &self,
        entity: NotificationEntity,
        expected_status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_notification(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_invitation(&self, entity: InvitationEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    fn find_invitation(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>>;
    fn find_invitation_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>>;
    fn list_invitations(
        &self,
        invited_by: String,
    ) -> BoxFuture<'static, StorageResult<Vec<InvitationEntity>>>;
    fn replace_invitation(
        &self,
        entity: InvitationEntity,
        expected_status: InvitationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_booking(&self, entity: BookingEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_booking(&self, id: String)
    -> BoxFuture<'static, StorageResult<Option<BookingEntity>>>;
    fn list_bookings(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>>;
    fn list_venue_bookings(
        &self,
        venue_id: String,
        status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>>;
    fn replace_booking(
        &self,
        entity: BookingEntity,
        expected_status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    fn upsert_team_member(&self, member: TeamMemberEntity)
    -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
