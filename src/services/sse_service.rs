use std::{convert::Infallible, time::Duration};

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::{match_service, sse_events},
    state::SharedState,
};

/// Live feed of one match: the snapshot taken at connection time followed by every
/// broadcast event.
///
/// Dropping the subscription releases its receiver and prunes the match hub once no
/// spectator is left.
pub struct MatchSubscription {
    state: SharedState,
    match_id: String,
    receiver: Option<broadcast::Receiver<ServerEvent>>,
    snapshot: Option<ServerEvent>,
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        self.receiver.take();
        self.state.match_hubs().prune(&self.match_id);
        info!(match_id = %self.match_id, "match SSE stream disconnected");
    }
}

/// Subscribe to the events of `match_id`.
///
/// The receiver is registered before the snapshot is read so no update committed after
/// the snapshot can be missed. Spectators may see an event older than the snapshot and
/// discard it by `version`.
pub async fn subscribe_match(
    state: &SharedState,
    match_id: &str,
) -> Result<MatchSubscription, ServiceError> {
    let receiver = state.match_hubs().subscribe(match_id);
    let mut subscription = MatchSubscription {
        state: state.clone(),
        match_id: match_id.to_owned(),
        receiver: Some(receiver),
        snapshot: None,
    };

    let entity = match_service::load_match(state, match_id).await?;
    subscription.snapshot = sse_events::snapshot_event(entity);
    info!(match_id, "match SSE stream connected");
    Ok(subscription)
}

/// Events of a subscription in delivery order, ending when the hub closes.
pub fn event_stream(mut subscription: MatchSubscription) -> impl Stream<Item = ServerEvent> {
    stream! {
        if let Some(snapshot) = subscription.snapshot.take() {
            yield snapshot;
        }

        while let Some(receiver) = subscription.receiver.as_mut() {
            match receiver.recv().await {
                Ok(event) => yield event,
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    // Every match event carries the full state, the next one catches up.
                    debug!(match_id = %subscription.match_id, skipped, "match SSE stream lagged");
                }
            }
        }
    }
}

/// Convert a match subscription into an SSE response with keep-alive comments.
pub fn to_sse_stream(
    subscription: MatchSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = event_stream(subscription).map(|payload| {
        Ok::<_, Infallible>(Event::default().event(payload.event).data(payload.data))
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
