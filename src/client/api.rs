use futures::future::BoxFuture;

use crate::{
    client::ClientResult,
    dao::models::NotificationStatus,
    dto::{
        matches::{MatchResponse, ParticipantsResponse, RosterResponse},
        notifications::NotificationResponse,
    },
};

/// Remote calls the pollers depend on, implemented over HTTP by
/// [`HttpApi`](crate::client::http::HttpApi).
pub trait PlaykersApi: Send + Sync {
    fn get_match(&self, id: String) -> BoxFuture<'static, ClientResult<MatchResponse>>;
    fn get_participants(
        &self,
        id: String,
    ) -> BoxFuture<'static, ClientResult<ParticipantsResponse>>;
    fn get_roster(&self, id: String) -> BoxFuture<'static, ClientResult<RosterResponse>>;

    fn unread_count(&self) -> BoxFuture<'static, ClientResult<u64>>;
    fn list_notifications(&self) -> BoxFuture<'static, ClientResult<Vec<NotificationResponse>>>;
    fn update_notification_status(
        &self,
        id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, ClientResult<NotificationResponse>>;
}
