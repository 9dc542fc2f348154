use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use urlencoding::encode;

use crate::{
    client::{ClientError, ClientResult, PlaykersApi},
    dao::models::NotificationStatus,
    dto::{
        matches::{MatchResponse, ParticipantsResponse, RosterResponse},
        notifications::{NotificationResponse, UnreadCountResponse, UpdateNotificationStatusRequest},
    },
    identity::{USER_ID_HEADER, USER_NAME_HEADER},
};

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`PlaykersApi`] over the REST endpoints.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Arc<str>,
    identity: Option<(Arc<str>, Option<Arc<str>>)>,
}

impl HttpApi {
    /// Anonymous client, enough for spectator reads.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ClientError::Request {
                path: base_url.to_owned(),
                source: Box::new(source),
            })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            identity: None,
        })
    }

    /// Send the gateway identity headers with every request.
    pub fn with_identity(mut self, user_id: &str, name: Option<&str>) -> Self {
        self.identity = Some((Arc::from(user_id), name.map(Arc::from)));
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.identity {
            Some((id, Some(name))) => builder
                .header(USER_ID_HEADER, id.as_ref())
                .header(USER_NAME_HEADER, name.as_ref()),
            Some((id, None)) => builder.header(USER_ID_HEADER, id.as_ref()),
            None => builder,
        }
    }

    async fn get_json<T>(self, path: String) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = send(self.request(Method::GET, &path), &path).await?;
        decode(response, &path).await
    }

    async fn patch_json<B, T>(self, path: String, body: B) -> ClientResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = send(self.request(Method::PATCH, &path).json(&body), &path).await?;
        decode(response, &path).await
    }
}

async fn send(builder: RequestBuilder, path: &str) -> ClientResult<Response> {
    let response = builder.send().await.map_err(|source| ClientError::Request {
        path: path.to_owned(),
        source: Box::new(source),
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.message);
    if status == StatusCode::UNAUTHORIZED {
        Err(ClientError::Unauthorized { message })
    } else {
        Err(ClientError::Status {
            path: path.to_owned(),
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|source| ClientError::Request {
            path: path.to_owned(),
            source: Box::new(source),
        })
}

impl PlaykersApi for HttpApi {
    fn get_match(&self, id: String) -> BoxFuture<'static, ClientResult<MatchResponse>> {
        let api = self.clone();
        Box::pin(async move { api.get_json(format!("/api/matches/{}", encode(&id))).await })
    }

    fn get_participants(
        &self,
        id: String,
    ) -> BoxFuture<'static, ClientResult<ParticipantsResponse>> {
        let api = self.clone();
        Box::pin(async move {
            api.get_json(format!("/api/matches/{}/participants", encode(&id)))
                .await
        })
    }

    fn get_roster(&self, id: String) -> BoxFuture<'static, ClientResult<RosterResponse>> {
        let api = self.clone();
        Box::pin(async move { api.get_json(format!("/api/matches/{}/roster", encode(&id))).await })
    }

    fn unread_count(&self) -> BoxFuture<'static, ClientResult<u64>> {
        let api = self.clone();
        Box::pin(async move {
            api.get_json::<UnreadCountResponse>("/api/notifications/unread-count".into())
                .await
                .map(|body| body.count)
        })
    }

    fn list_notifications(&self) -> BoxFuture<'static, ClientResult<Vec<NotificationResponse>>> {
        let api = self.clone();
        Box::pin(async move { api.get_json("/api/notifications".into()).await })
    }

    fn update_notification_status(
        &self,
        id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, ClientResult<NotificationResponse>> {
        let api = self.clone();
        Box::pin(async move {
            api.patch_json(
                format!("/api/notifications/{}/status", encode(&id)),
                UpdateNotificationStatusRequest { status },
            )
            .await
        })
    }
}
