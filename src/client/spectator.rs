use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::sleep,
};
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::{
    client::{
        PlaykersApi,
        feedback::{Feedback, feedback_for_error},
        set_flag,
    },
    dto::matches::{MatchResponse, ParticipantsResponse, RosterResponse},
};

/// Latest data shown by the spectator view.
#[derive(Debug, Clone, Default)]
pub struct SpectatorSnapshot {
    pub match_details: Option<MatchResponse>,
    pub participants: Option<ParticipantsResponse>,
    pub roster: Option<RosterResponse>,
    /// Feedback of the last failed refresh, cleared by the next complete one.
    pub feedback: Option<Feedback>,
}

/// Refreshes match, participants and roster on a fixed interval while auto-refresh
/// is on. Every tick refetches the three documents in full.
pub struct SpectatorPoller {
    auto_refresh: watch::Sender<bool>,
    snapshot: watch::Receiver<SpectatorSnapshot>,
    task: JoinHandle<()>,
}

impl SpectatorPoller {
    /// Start polling `match_id` immediately, auto-refresh on.
    pub fn spawn(
        api: Arc<dyn PlaykersApi>,
        match_id: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let (auto_refresh, auto_rx) = watch::channel(true);
        let (snapshot_tx, snapshot) = watch::channel(SpectatorSnapshot::default());
        let task = tokio::spawn(poll(api, match_id.into(), interval, auto_rx, snapshot_tx));

        Self {
            auto_refresh,
            snapshot,
            task,
        }
    }

    /// Toggle auto-refresh. Turning it back on refreshes right away.
    pub fn set_auto_refresh(&self, enabled: bool) {
        set_flag(&self.auto_refresh, enabled);
    }

    pub fn auto_refresh(&self) -> bool {
        *self.auto_refresh.borrow()
    }

    pub fn snapshot(&self) -> SpectatorSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn updates(&self) -> WatchStream<SpectatorSnapshot> {
        WatchStream::new(self.snapshot.clone())
    }
}

impl Drop for SpectatorPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(
    api: Arc<dyn PlaykersApi>,
    match_id: String,
    interval: Duration,
    mut auto_refresh: watch::Receiver<bool>,
    snapshot: watch::Sender<SpectatorSnapshot>,
) {
    loop {
        if !*auto_refresh.borrow_and_update() {
            if auto_refresh.changed().await.is_err() {
                return;
            }
            continue;
        }

        refresh(api.as_ref(), &match_id, &snapshot).await;

        tokio::select! {
            _ = sleep(interval) => {}
            changed = auto_refresh.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

async fn refresh(
    api: &dyn PlaykersApi,
    match_id: &str,
    snapshot: &watch::Sender<SpectatorSnapshot>,
) {
    let (details, participants, roster) = tokio::join!(
        api.get_match(match_id.to_owned()),
        api.get_participants(match_id.to_owned()),
        api.get_roster(match_id.to_owned()),
    );

    snapshot.send_modify(|current| {
        let mut failure = None;
        match details {
            Ok(value) => current.match_details = Some(value),
            Err(err) => failure = Some(err),
        }
        match participants {
            Ok(value) => current.participants = Some(value),
            Err(err) => failure = failure.or(Some(err)),
        }
        match roster {
            Ok(value) => current.roster = Some(value),
            Err(err) => failure = failure.or(Some(err)),
        }

        current.feedback = failure.map(|err| {
            debug!(match_id, error = %err, "spectator refresh failed");
            feedback_for_error(&err)
        });
    });
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::client::{PollingConfig, feedback::GENERIC_ERROR_MESSAGE, testing::MockApi};

    fn poller(api: &MockApi) -> SpectatorPoller {
        SpectatorPoller::spawn(
            Arc::new(api.clone()),
            "m1",
            PollingConfig::default().spectator,
        )
    }

    fn calls(api: &MockApi) -> (usize, usize, usize) {
        (api.match_calls(), api.participant_calls(), api.roster_calls())
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_five_seconds() {
        let api = MockApi::new();
        let poller = poller(&api);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls(&api), (1, 1, 1));
        assert_eq!(
            poller.snapshot().match_details.map(|details| details.id),
            Some("m1".to_string())
        );

        sleep(Duration::from_secs(10)).await;
        assert_eq!(calls(&api), (3, 3, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn turning_auto_refresh_off_stops_every_poll() {
        let api = MockApi::new();
        let poller = poller(&api);
        sleep(Duration::from_millis(100)).await;

        poller.set_auto_refresh(false);
        assert!(!poller.auto_refresh());
        sleep(Duration::from_secs(60)).await;
        assert_eq!(calls(&api), (1, 1, 1));

        poller.set_auto_refresh(true);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls(&api), (2, 2, 2));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(calls(&api), (3, 3, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn enabling_an_already_running_poller_does_not_refetch() {
        let api = MockApi::new();
        let poller = poller(&api);
        sleep(Duration::from_millis(100)).await;

        poller.set_auto_refresh(true);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls(&api), (1, 1, 1));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(calls(&api), (2, 2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_surface_as_feedback() {
        let api = MockApi::new();
        api.fail_match_with(500);
        let poller = poller(&api);

        let mut updates = poller.updates();
        let mut latest = updates.next().await.unwrap();
        while latest.feedback.is_none() {
            latest = updates.next().await.unwrap();
        }

        assert_eq!(
            latest.feedback,
            Some(Feedback::toast(GENERIC_ERROR_MESSAGE))
        );
        assert!(latest.match_details.is_none());
        assert!(latest.roster.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_it() {
        let api = MockApi::new();
        let poller = poller(&api);
        sleep(Duration::from_millis(100)).await;
        drop(poller);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(calls(&api), (1, 1, 1));
    }
}
