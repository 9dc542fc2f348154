use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoBookingDocument, MongoInvitationDocument, MongoMatchDocument,
        MongoNotificationDocument, MongoTeamMemberDocument,
    },
};
use crate::dao::{
    models::{
        BookingEntity, BookingStatus, InvitationEntity, InvitationStatus, MatchEntity,
        MatchFilter, NotificationEntity, NotificationStatus, TeamMemberEntity,
    },
    storage::StorageResult,
    store::PlaykersStore,
};

const MATCHES: &str = "matches";
const NOTIFICATIONS: &str = "notifications";
const INVITATIONS: &str = "invitations";
const BOOKINGS: &str = "bookings";
const TEAM_MEMBERS: &str = "team_members";

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::Ping { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        let mut guard = self.database.write().await;
        *guard = database;
        Ok(())
    }
}

fn by_id(id: &str) -> Document {
    doc! { "id": id }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl MongoStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        for collection in [MATCHES, NOTIFICATIONS, INVITATIONS, BOOKINGS] {
            self.create_index(collection, "id", doc! { "id": 1 }, true)
                .await?;
        }
        self.create_index(INVITATIONS, "token", doc! { "token": 1 }, true)
            .await?;
        self.create_index(
            NOTIFICATIONS,
            "recipientUserId,status",
            doc! { "recipientUserId": 1, "status": 1 },
            false,
        )
        .await?;
        self.create_index(
            BOOKINGS,
            "venueId,status",
            doc! { "venueId": 1, "status": 1 },
            false,
        )
        .await?;
        self.create_index(
            TEAM_MEMBERS,
            "teamId,userId",
            doc! { "teamId": 1, "userId": 1 },
            true,
        )
        .await?;
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &'static str,
        index: &'static str,
        keys: Document,
        unique: bool,
    ) -> MongoResult<()> {
        let database = self.database().await;
        let model = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                    .unique(Some(unique))
                    .build(),
            )
            .build();

        database
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection,
                index,
                source,
            })?;
        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database().await.collection::<T>(name)
    }

    async fn insert<D>(&self, collection: &'static str, id: String, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::Duplicate { collection, id: id.clone() }
                } else {
                    MongoDaoError::Write {
                        collection,
                        id: id.clone(),
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_one<D>(&self, collection: &'static str, filter: Document, id: String) -> MongoResult<Option<D>>
    where
        D: DeserializeOwned + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Load {
                collection,
                id,
                source,
            })
    }

    async fn find_many<D>(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<D>>
    where
        D: DeserializeOwned + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::Query { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query { collection, source })
    }

    /// Replace the document matching `filter`, reporting whether the guard still held.
    async fn replace_guarded<D>(
        &self,
        collection: &'static str,
        filter: Document,
        id: String,
        document: D,
    ) -> MongoResult<bool>
    where
        D: Serialize + Send + Sync,
    {
        let result = self
            .collection::<D>(collection)
            .await
            .replace_one(filter, &document)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id,
                source,
            })?;
        Ok(result.matched_count == 1)
    }

    async fn find_match(&self, id: String) -> MongoResult<Option<MatchEntity>> {
        let document: Option<MongoMatchDocument> =
            self.find_one(MATCHES, by_id(&id), id).await?;
        Ok(document.map(Into::into))
    }

    async fn list_matches(&self, filter: MatchFilter) -> MongoResult<Vec<MatchEntity>> {
        let mut query = Document::new();
        if let Some(status) = filter.status {
            query.insert("status", status.as_str());
        }
        if let Some(sport) = filter.sport {
            query.insert("sport", sport.as_str());
        }
        let documents: Vec<MongoMatchDocument> = self
            .find_many(MATCHES, query, doc! { "createdAt": -1 })
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn replace_match(&self, entity: MatchEntity, expected_version: u64) -> MongoResult<bool> {
        let id = entity.id.clone();
        let filter = doc! { "id": id.as_str(), "version": expected_version as i64 };
        let document: MongoMatchDocument = entity.into();
        self.replace_guarded(MATCHES, filter, id, document).await
    }

    async fn find_notification(&self, id: String) -> MongoResult<Option<NotificationEntity>> {
        let document: Option<MongoNotificationDocument> =
            self.find_one(NOTIFICATIONS, by_id(&id), id).await?;
        Ok(document.map(Into::into))
    }

    async fn list_notifications(
        &self,
        recipient_user_id: String,
        status: Option<NotificationStatus>,
    ) -> MongoResult<Vec<NotificationEntity>> {
        let mut query = doc! { "recipientUserId": recipient_user_id };
        if let Some(status) = status {
            query.insert("status", status.as_str());
        }
        let documents: Vec<MongoNotificationDocument> = self
            .find_many(NOTIFICATIONS, query, doc! { "createdAt": -1 })
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn count_notifications(
        &self,
        recipient_user_id: String,
        status: NotificationStatus,
    ) -> MongoResult<u64> {
        self.collection::<MongoNotificationDocument>(NOTIFICATIONS)
            .await
            .count_documents(doc! { "recipientUserId": recipient_user_id, "status": status.as_str() })
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: NOTIFICATIONS,
                source,
            })
    }

    async fn replace_notification(
        &self,
        entity: NotificationEntity,
        expected_status: NotificationStatus,
    ) -> MongoResult<bool> {
        let id = entity.id.clone();
        let filter = doc! { "id": id.as_str(), "status": expected_status.as_str() };
        let document: MongoNotificationDocument = entity.into();
        self.replace_guarded(NOTIFICATIONS, filter, id, document).await
    }

    async fn delete_notification(&self, id: String) -> MongoResult<bool> {
        let result = self
            .collection::<MongoNotificationDocument>(NOTIFICATIONS)
            .await
            .delete_one(by_id(&id))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: NOTIFICATIONS,
                id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn find_invitation(&self, filter: Document, key: String) -> MongoResult<Option<InvitationEntity>> {
        let document: Option<MongoInvitationDocument> =
            self.find_one(INVITATIONS, filter, key).await?;
        Ok(document.map(Into::into))
    }

    async fn list_invitations(&self, invited_by: String) -> MongoResult<Vec<InvitationEntity>> {
        let documents: Vec<MongoInvitationDocument> = self
            .find_many(
                INVITATIONS,
                doc! { "invitedBy": invited_by },
                doc! { "createdAt": -1 },
            )
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn replace_invitation(
        &self,
        entity: InvitationEntity,
        expected_status: InvitationStatus,
    ) -> MongoResult<bool> {
        let id = entity.id.clone();
        let filter = doc! { "id": id.as_str(), "status": expected_status.as_str() };
        let document: MongoInvitationDocument = entity.into();
        self.replace_guarded(INVITATIONS, filter, id, document).await
    }

    async fn find_booking(&self, id: String) -> MongoResult<Option<BookingEntity>> {
        let document: Option<MongoBookingDocument> =
            self.find_one(BOOKINGS, by_id(&id), id).await?;
        Ok(document.map(Into::into))
    }

    async fn list_bookings(&self, filter: Document) -> MongoResult<Vec<BookingEntity>> {
        let documents: Vec<MongoBookingDocument> = self
            .find_many(BOOKINGS, filter, doc! { "startsAt": 1 })
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn replace_booking(
        &self,
        entity: BookingEntity,
        expected_status: BookingStatus,
    ) -> MongoResult<bool> {
        let id = entity.id.clone();
        let filter = doc! { "id": id.as_str(), "status": expected_status.as_str() };
        let document: MongoBookingDocument = entity.into();
        self.replace_guarded(BOOKINGS, filter, id, document).await
    }

    async fn upsert_team_member(&self, member: TeamMemberEntity) -> MongoResult<()> {
        let document: MongoTeamMemberDocument = member.into();
        let id = format!("{}/{}", document.team_id, document.user_id);
        let filter = doc! {
            "teamId": document.team_id.as_str(),
            "userId": document.user_id.as_str(),
        };
        self.collection::<MongoTeamMemberDocument>(TEAM_MEMBERS)
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: TEAM_MEMBERS,
                id,
                source,
            })?;
        Ok(())
    }
}

impl PlaykersStore for MongoStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = entity.id.clone();
            let document: MongoMatchDocument = entity.into();
            store.insert(MATCHES, id, document).await.map_err(Into::into)
        })
    }

    fn find_match(&self, id: String) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(filter).await.map_err(Into::into) })
    }

    fn replace_match(
        &self,
        entity: MatchEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_match(entity, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_notification(
        &self,
        entity: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = entity.id.clone();
            let document: MongoNotificationDocument = entity.into();
            store
                .insert(NOTIFICATIONS, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_notification(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_notification(id).await.map_err(Into::into) })
    }

    fn list_notifications(
        &self,
        recipient_user_id: String,
        status: Option<NotificationStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<NotificationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_notifications(recipient_user_id, status)
                .await
                .map_err(Into::into)
        })
    }

    fn count_notifications(
        &self,
        recipient_user_id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_notifications(recipient_user_id, status)
                .await
                .map_err(Into::into)
        })
    }

    fn replace_notification(
        &self,
        entity: NotificationEntity,
        expected_status: NotificationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_notification(entity, expected_status)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_notification(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_notification(id).await.map_err(Into::into) })
    }

    fn insert_invitation(
        &self,
        entity: InvitationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = entity.id.clone();
            let document: MongoInvitationDocument = entity.into();
            store
                .insert(INVITATIONS, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_invitation(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_invitation(by_id(&id), id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_invitation_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<InvitationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! { "token": token.as_str() };
            store
                .find_invitation(filter, "<token>".to_owned())
                .await
                .map_err(Into::into)
        })
    }

    fn list_invitations(
        &self,
        invited_by: String,
    ) -> BoxFuture<'static, StorageResult<Vec<InvitationEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_invitations(invited_by).await.map_err(Into::into) })
    }

    fn replace_invitation(
        &self,
        entity: InvitationEntity,
        expected_status: InvitationStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_invitation(entity, expected_status)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_booking(&self, entity: BookingEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = entity.id.clone();
            let document: MongoBookingDocument = entity.into();
            store.insert(BOOKINGS, id, document).await.map_err(Into::into)
        })
    }

    fn find_booking(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_booking(id).await.map_err(Into::into) })
    }

    fn list_bookings(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_bookings(doc! { "userId": user_id })
                .await
                .map_err(Into::into)
        })
    }

    fn list_venue_bookings(
        &self,
        venue_id: String,
        status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_bookings(doc! { "venueId": venue_id, "status": status.as_str() })
                .await
                .map_err(Into::into)
        })
    }

    fn replace_booking(
        &self,
        entity: BookingEntity,
        expected_status: BookingStatus,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_booking(entity, expected_status)
                .await
                .map_err(Into::into)
        })
    }

    fn upsert_team_member(
        &self,
        member: TeamMemberEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_team_member(member).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
