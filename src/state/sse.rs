use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Per-match hubs, created on first subscription and dropped once nobody listens.
pub struct MatchHubs {
    hubs: DashMap<String, SseHub>,
    capacity: usize,
}

impl MatchHubs {
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to the hub of `match_id`, creating it when needed.
    pub fn subscribe(&self, match_id: &str) -> broadcast::Receiver<ServerEvent> {
        self.hubs
            .entry(match_id.to_owned())
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Fan an event out to the spectators of `match_id`. No-op when nobody is watching.
    pub fn broadcast(&self, match_id: &str, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(match_id) {
            hub.broadcast(event);
        }
        self.prune(match_id);
    }

    /// Drop the hub of `match_id` if it has no subscribers left.
    pub fn prune(&self, match_id: &str) {
        self.hubs
            .remove_if(match_id, |_, hub| hub.receiver_count() == 0);
    }

    /// Number of matches currently watched.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &'static str) -> ServerEvent {
        ServerEvent {
            event: name,
            data: "{}".into(),
        }
    }

    #[test]
    fn hub_is_pruned_once_last_subscriber_leaves() {
        let hubs = MatchHubs::new(4);
        let first = hubs.subscribe("m1");
        let second = hubs.subscribe("m1");
        assert_eq!(hubs.len(), 1);

        drop(first);
        hubs.prune("m1");
        assert_eq!(hubs.len(), 1);

        drop(second);
        hubs.prune("m1");
        assert!(hubs.is_empty());
    }

    #[tokio::test]
    async fn broadcast_reaches_only_the_watched_match() {
        let hubs = MatchHubs::new(4);
        let mut receiver = hubs.subscribe("m1");

        hubs.broadcast("m2", event("match.updated"));
        hubs.broadcast("m1", event("match.status"));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, "match.status");
        assert_eq!(hubs.len(), 1);
    }
}
