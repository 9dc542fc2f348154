//! Scripted [`PlaykersApi`] used by the poller tests.

use std::{
    collections::{HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use futures::future::{BoxFuture, ready};
use indexmap::IndexMap;

use crate::{
    client::{ClientError, ClientResult, PlaykersApi},
    dao::models::{MatchStatus, NotificationKind, NotificationStatus, Sport},
    dto::{
        matches::{MatchResponse, ParticipantsResponse, RosterResponse, RosterSide},
        notifications::NotificationResponse,
    },
};

#[derive(Default)]
struct Calls {
    matches: usize,
    participants: usize,
    rosters: usize,
    unread: usize,
    lists: usize,
    status_updates: Vec<(String, NotificationStatus)>,
}

#[derive(Clone, Default)]
pub(crate) struct MockApi {
    calls: Arc<Mutex<Calls>>,
    unread_counts: Arc<Mutex<VecDeque<Result<u64, u16>>>>,
    notifications: Arc<Mutex<Vec<NotificationResponse>>>,
    failing_updates: Arc<Mutex<HashSet<String>>>,
    match_error: Arc<Mutex<Option<u16>>>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the answers of successive unread-count polls, `Err` carrying an HTTP
    /// status. The last answer repeats.
    pub(crate) fn script_unread(&self, answers: impl IntoIterator<Item = Result<u64, u16>>) {
        self.unread_counts.lock().unwrap().extend(answers);
    }

    pub(crate) fn set_notifications(&self, notifications: Vec<NotificationResponse>) {
        *self.notifications.lock().unwrap() = notifications;
    }

    /// Make the next status update of `id` fail once.
    pub(crate) fn fail_update_once(&self, id: &str) {
        self.failing_updates.lock().unwrap().insert(id.to_owned());
    }

    pub(crate) fn fail_match_with(&self, status: u16) {
        *self.match_error.lock().unwrap() = Some(status);
    }

    pub(crate) fn match_calls(&self) -> usize {
        self.calls.lock().unwrap().matches
    }

    pub(crate) fn participant_calls(&self) -> usize {
        self.calls.lock().unwrap().participants
    }

    pub(crate) fn roster_calls(&self) -> usize {
        self.calls.lock().unwrap().rosters
    }

    pub(crate) fn unread_calls(&self) -> usize {
        self.calls.lock().unwrap().unread
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls.lock().unwrap().lists
    }

    pub(crate) fn status_updates(&self) -> Vec<(String, NotificationStatus)> {
        self.calls.lock().unwrap().status_updates.clone()
    }
}

pub(crate) fn sample_match(id: &str) -> MatchResponse {
    MatchResponse {
        id: id.to_owned(),
        sport: Sport::Football,
        status: MatchStatus::Live,
        team1_id: "t1".into(),
        team2_id: "t2".into(),
        team1_name: "Reds".into(),
        team2_name: "Blues".into(),
        team1_score: None,
        team2_score: None,
        match_data: IndexMap::new(),
        participants: Vec::new(),
        created_by: "scorer".into(),
        venue_id: None,
        scheduled_at: None,
        created_at: "2026-06-01T10:00:00Z".into(),
        updated_at: "2026-06-01T10:00:00Z".into(),
        version: 1,
    }
}

pub(crate) fn notification(
    id: &str,
    kind: NotificationKind,
    status: NotificationStatus,
) -> NotificationResponse {
    NotificationResponse {
        id: id.to_owned(),
        recipient_user_id: "me".into(),
        sender_user_id: "them".into(),
        sender_name: "Them".into(),
        sender_email: None,
        sender_phone: None,
        kind,
        status,
        booking_id: None,
        match_type: None,
        location: None,
        message: None,
        created_at: "2026-06-01T10:00:00Z".into(),
        updated_at: "2026-06-01T10:00:00Z".into(),
    }
}

impl PlaykersApi for MockApi {
    fn get_match(&self, id: String) -> BoxFuture<'static, ClientResult<MatchResponse>> {
        self.calls.lock().unwrap().matches += 1;
        let result = match *self.match_error.lock().unwrap() {
            Some(401) => Err(ClientError::Unauthorized { message: None }),
            Some(status) => Err(ClientError::Status {
                path: format!("/api/matches/{id}"),
                status,
                message: None,
            }),
            None => Ok(sample_match(&id)),
        };
        Box::pin(ready(result))
    }

    fn get_participants(
        &self,
        id: String,
    ) -> BoxFuture<'static, ClientResult<ParticipantsResponse>> {
        self.calls.lock().unwrap().participants += 1;
        Box::pin(ready(Ok(ParticipantsResponse {
            match_id: id,
            participants: Vec::new(),
        })))
    }

    fn get_roster(&self, id: String) -> BoxFuture<'static, ClientResult<RosterResponse>> {
        self.calls.lock().unwrap().rosters += 1;
        let side = |team_id: &str, team_name: &str| RosterSide {
            team_id: team_id.into(),
            team_name: team_name.into(),
            players: Vec::new(),
        };
        Box::pin(ready(Ok(RosterResponse {
            match_id: id,
            team1: side("t1", "Reds"),
            team2: side("t2", "Blues"),
            unassigned: Vec::new(),
        })))
    }

    fn unread_count(&self) -> BoxFuture<'static, ClientResult<u64>> {
        self.calls.lock().unwrap().unread += 1;
        let mut answers = self.unread_counts.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().copied()
        };
        let result = answer.unwrap_or(Ok(0)).map_err(|status| ClientError::Status {
            path: "/api/notifications/unread-count".into(),
            status,
            message: None,
        });
        Box::pin(ready(result))
    }

    fn list_notifications(&self) -> BoxFuture<'static, ClientResult<Vec<NotificationResponse>>> {
        self.calls.lock().unwrap().lists += 1;
        Box::pin(ready(Ok(self.notifications.lock().unwrap().clone())))
    }

    fn update_notification_status(
        &self,
        id: String,
        status: NotificationStatus,
    ) -> BoxFuture<'static, ClientResult<NotificationResponse>> {
        self.calls
            .lock()
            .unwrap()
            .status_updates
            .push((id.clone(), status));

        if self.failing_updates.lock().unwrap().remove(&id) {
            return Box::pin(ready(Err(ClientError::Status {
                path: format!("/api/notifications/{id}/status"),
                status: 503,
                message: Some("degraded mode".into()),
            })));
        }

        let mut notifications = self.notifications.lock().unwrap();
        let updated = notifications
            .iter_mut()
            .find(|notification| notification.id == id)
            .map(|notification| {
                notification.status = status;
                notification.clone()
            })
            .unwrap_or_else(|| notification(&id, NotificationKind::BookingAccepted, status));
        Box::pin(ready(Ok(updated)))
    }
}
