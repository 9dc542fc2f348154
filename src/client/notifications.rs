use std::{collections::HashSet, sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::{
    sync::{
        Mutex,
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, warn};

use crate::{
    client::{
        PlaykersApi,
        feedback::{Feedback, feedback_for_error},
        set_flag,
    },
    dao::models::{NotificationKind, NotificationStatus},
    dto::notifications::NotificationResponse,
};

const FEEDBACK_BUFFER: usize = 16;

/// Turns successive unread counts into "new notifications" toasts.
///
/// The first observation only sets the baseline.
#[derive(Debug, Default)]
pub struct UnreadTracker {
    last: Option<u64>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` and return the toast text when it rose since the last poll.
    pub fn observe(&mut self, count: u64) -> Option<String> {
        let previous = self.last.replace(count)?;
        (count > previous).then(|| new_notifications_message(count - previous))
    }
}

fn new_notifications_message(arrived: u64) -> String {
    if arrived == 1 {
        "You have 1 new notification...".to_owned()
    } else {
        format!("You have {arrived} new notifications...")
    }
}

/// Polls the unread count while the app is in the foreground.
pub struct UnreadCountWatcher {
    foreground: watch::Sender<bool>,
    count: watch::Receiver<Option<u64>>,
    task: JoinHandle<()>,
}

impl UnreadCountWatcher {
    /// Start polling immediately. Toasts and failures are delivered on the returned
    /// receiver.
    pub fn spawn(
        api: Arc<dyn PlaykersApi>,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<Feedback>) {
        let (foreground, foreground_rx) = watch::channel(true);
        let (count_tx, count) = watch::channel(None);
        let (feedback_tx, feedback_rx) = mpsc::channel(FEEDBACK_BUFFER);
        let task = tokio::spawn(poll_unread(
            api,
            interval,
            foreground_rx,
            count_tx,
            feedback_tx,
        ));

        (
            Self {
                foreground,
                count,
                task,
            },
            feedback_rx,
        )
    }

    /// Pause polling in the background; returning to the foreground polls right away.
    pub fn set_foreground(&self, foreground: bool) {
        set_flag(&self.foreground, foreground);
    }

    /// Last unread count received, if any poll succeeded yet.
    pub fn count(&self) -> Option<u64> {
        *self.count.borrow()
    }
}

impl Drop for UnreadCountWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_unread(
    api: Arc<dyn PlaykersApi>,
    interval: Duration,
    mut foreground: watch::Receiver<bool>,
    count: watch::Sender<Option<u64>>,
    feedback: mpsc::Sender<Feedback>,
) {
    let mut tracker = UnreadTracker::new();

    loop {
        if !*foreground.borrow_and_update() {
            if foreground.changed().await.is_err() {
                return;
            }
            continue;
        }

        match api.unread_count().await {
            Ok(current) => {
                count.send_replace(Some(current));
                if let Some(message) = tracker.observe(current) {
                    deliver(&feedback, Feedback::toast(message));
                }
            }
            Err(err) => {
                debug!(error = %err, "unread count poll failed");
                deliver(&feedback, feedback_for_error(&err));
            }
        }

        tokio::select! {
            _ = sleep(interval) => {}
            changed = foreground.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Hand `item` to the view without ever blocking the poll on a slow reader.
fn deliver(feedback: &mpsc::Sender<Feedback>, item: Feedback) {
    match feedback.try_send(item) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => {
            warn!(?dropped, "feedback buffer full; dropping message");
        }
        Err(TrySendError::Closed(_)) => debug!("feedback receiver dropped"),
    }
}

/// Notification list behind the header dropdown.
///
/// The list is fetched only while the dropdown is open. Every fetch marks unread
/// `booking_accepted` notifications as read, at most once per notification.
pub struct NotificationDropdown {
    open: watch::Sender<bool>,
    notifications: watch::Receiver<Vec<NotificationResponse>>,
    task: JoinHandle<()>,
}

impl NotificationDropdown {
    pub fn spawn(api: Arc<dyn PlaykersApi>, interval: Duration) -> Self {
        let (open, open_rx) = watch::channel(false);
        let (list_tx, notifications) = watch::channel(Vec::new());
        let marker = ReadMarker::new(api.clone());
        let task = tokio::spawn(poll_list(api, interval, open_rx, list_tx, marker));

        Self {
            open,
            notifications,
            task,
        }
    }

    pub fn open(&self) {
        set_flag(&self.open, true);
    }

    pub fn close(&self) {
        set_flag(&self.open, false);
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Notifications from the last fetch.
    pub fn notifications(&self) -> Vec<NotificationResponse> {
        self.notifications.borrow().clone()
    }
}

impl Drop for NotificationDropdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_list(
    api: Arc<dyn PlaykersApi>,
    interval: Duration,
    mut open: watch::Receiver<bool>,
    list: watch::Sender<Vec<NotificationResponse>>,
    marker: ReadMarker,
) {
    loop {
        if !*open.borrow_and_update() {
            if open.changed().await.is_err() {
                return;
            }
            continue;
        }

        match api.list_notifications().await {
            Ok(fetched) => {
                let marked = marker.mark_accepted_bookings(&fetched).await;
                list.send_replace(apply_marked(fetched, &marked));
            }
            Err(err) => warn!(error = %err, "notification list poll failed"),
        }

        tokio::select! {
            _ = sleep(interval) => {}
            changed = open.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

fn apply_marked(
    mut notifications: Vec<NotificationResponse>,
    marked: &[String],
) -> Vec<NotificationResponse> {
    for notification in &mut notifications {
        if marked.contains(&notification.id) {
            notification.status = NotificationStatus::Read;
        }
    }
    notifications
}

/// Sends the `read` update of accepted bookings, deduplicated across fetches.
struct ReadMarker {
    api: Arc<dyn PlaykersApi>,
    /// Ids already marked or in flight.
    claimed: Mutex<HashSet<String>>,
}

impl ReadMarker {
    fn new(api: Arc<dyn PlaykersApi>) -> Self {
        Self {
            api,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Mark every unread `booking_accepted` notification of `notifications` as read and
    /// return the ids that were updated by this call.
    async fn mark_accepted_bookings(&self, notifications: &[NotificationResponse]) -> Vec<String> {
        let pending: Vec<String> = {
            let mut claimed = self.claimed.lock().await;
            notifications
                .iter()
                .filter(|notification| {
                    notification.kind == NotificationKind::BookingAccepted
                        && notification.status == NotificationStatus::Unread
                })
                .filter(|notification| claimed.insert(notification.id.clone()))
                .map(|notification| notification.id.clone())
                .collect()
        };

        let results = join_all(pending.into_iter().map(|id| {
            let update = self
                .api
                .update_notification_status(id.clone(), NotificationStatus::Read);
            async move { (id, update.await) }
        }))
        .await;

        let mut marked = Vec::new();
        for (id, result) in results {
            match result {
                Ok(_) => marked.push(id),
                Err(err) => {
                    warn!(notification_id = %id, error = %err, "failed to mark accepted booking as read");
                    self.claimed.lock().await.remove(&id);
                }
            }
        }
        marked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        PollingConfig,
        testing::{MockApi, notification},
    };

    #[test]
    fn first_observation_is_the_baseline() {
        let mut tracker = UnreadTracker::new();
        assert_eq!(tracker.observe(3), None);
        assert_eq!(tracker.observe(3), None);
        assert_eq!(tracker.observe(1), None);
        assert_eq!(
            tracker.observe(2).as_deref(),
            Some("You have 1 new notification...")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rise_from_zero_to_two_emits_one_toast() {
        let api = MockApi::new();
        api.script_unread([Ok(0), Ok(2)]);
        let (watcher, mut feedback) =
            UnreadCountWatcher::spawn(Arc::new(api.clone()), PollingConfig::default().unread_count);

        sleep(Duration::from_secs(95)).await;
        assert_eq!(api.unread_calls(), 4);
        assert_eq!(watcher.count(), Some(2));

        assert_eq!(
            feedback.try_recv().unwrap(),
            Feedback::toast("You have 2 new notifications...")
        );
        assert!(feedback.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn background_pauses_the_unread_poll() {
        let api = MockApi::new();
        let (watcher, _feedback) =
            UnreadCountWatcher::spawn(Arc::new(api.clone()), PollingConfig::default().unread_count);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(api.unread_calls(), 1);

        watcher.set_foreground(false);
        sleep(Duration::from_secs(120)).await;
        assert_eq!(api.unread_calls(), 1);

        watcher.set_foreground(true);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(api.unread_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unread_poll_failure_becomes_feedback() {
        let api = MockApi::new();
        api.script_unread([Err(500), Ok(0)]);
        let (_watcher, mut feedback) =
            UnreadCountWatcher::spawn(Arc::new(api.clone()), PollingConfig::default().unread_count);

        sleep(Duration::from_millis(100)).await;
        assert!(matches!(
            feedback.try_recv().unwrap(),
            Feedback::Toast { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn undrained_feedback_does_not_stall_the_poll() {
        let api = MockApi::new();
        api.script_unread([Err(500)]);
        let (_watcher, mut feedback) =
            UnreadCountWatcher::spawn(Arc::new(api.clone()), PollingConfig::default().unread_count);

        sleep(Duration::from_secs(30 * 24)).await;
        assert!(api.unread_calls() > FEEDBACK_BUFFER + 4);

        let mut buffered = 0;
        while feedback.try_recv().is_ok() {
            buffered += 1;
        }
        assert_eq!(buffered, FEEDBACK_BUFFER);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_the_foreground_twice_polls_once() {
        let api = MockApi::new();
        let (watcher, _feedback) =
            UnreadCountWatcher::spawn(Arc::new(api.clone()), PollingConfig::default().unread_count);
        sleep(Duration::from_millis(100)).await;

        watcher.set_foreground(true);
        watcher.set_foreground(true);
        sleep(Duration::from_millis(100)).await;
        assert_eq!(api.unread_calls(), 1);
    }

    fn inbox() -> Vec<NotificationResponse> {
        vec![
            notification("n1", NotificationKind::BookingAccepted, NotificationStatus::Unread),
            notification("n2", NotificationKind::BookingAccepted, NotificationStatus::Unread),
            notification("n3", NotificationKind::BookingAccepted, NotificationStatus::Read),
            notification("n4", NotificationKind::MatchRequest, NotificationStatus::Unread),
        ]
    }

    fn marked_ids(api: &MockApi) -> Vec<String> {
        let mut ids: Vec<String> = api
            .status_updates()
            .into_iter()
            .map(|(id, status)| {
                assert_eq!(status, NotificationStatus::Read);
                id
            })
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test(start_paused = true)]
    async fn opening_marks_each_accepted_booking_once() {
        let api = MockApi::new();
        api.set_notifications(inbox());
        let dropdown = NotificationDropdown::spawn(
            Arc::new(api.clone()),
            PollingConfig::default().notification_list,
        );

        sleep(Duration::from_secs(60)).await;
        assert_eq!(api.list_calls(), 0);

        dropdown.open();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(api.list_calls(), 1);
        assert_eq!(marked_ids(&api), ["n1", "n2"]);
        let shown = dropdown.notifications();
        assert!(shown.iter().take(2).all(|n| n.status == NotificationStatus::Read));
        assert_eq!(shown[3].status, NotificationStatus::Unread);

        // A stale list still showing them unread must not re-fire.
        api.set_notifications(inbox());
        dropdown.close();
        sleep(Duration::from_millis(100)).await;
        dropdown.open();
        sleep(Duration::from_secs(16)).await;
        assert_eq!(api.list_calls(), 3);
        assert_eq!(marked_ids(&api), ["n1", "n2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_mark_is_retried_on_next_fetch() {
        let api = MockApi::new();
        api.set_notifications(inbox());
        api.fail_update_once("n2");
        let dropdown = NotificationDropdown::spawn(
            Arc::new(api.clone()),
            PollingConfig::default().notification_list,
        );

        dropdown.open();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(marked_ids(&api), ["n1", "n2"]);
        assert!(dropdown.is_open());

        sleep(Duration::from_secs(15)).await;
        assert_eq!(marked_ids(&api), ["n1", "n2", "n2"]);
    }
}
