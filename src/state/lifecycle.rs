use std::fmt;

use thiserror::Error;

use crate::dao::models::{InvitationStatus, MatchStatus, NotificationStatus};

/// Operator actions that move a match through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Scorer starts an upcoming match.
    Start,
    /// Play is suspended (rain, injury, break).
    Pause,
    /// Play resumes after a pause.
    Resume,
    /// Final whistle; the result is computed.
    Complete,
}

impl MatchEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchEvent::Start => "start",
            MatchEvent::Pause => "pause",
            MatchEvent::Resume => "resume",
            MatchEvent::Complete => "complete",
        }
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when attempting to apply an invalid match transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} a match that is {}", from.as_str())]
pub struct InvalidTransition {
    /// Status the match was in when the event was received.
    pub from: MatchStatus,
    /// The event that cannot be applied from this status.
    pub event: MatchEvent,
}

/// Compute the status reached by applying `event` to a match in `from`.
pub fn next_match_status(
    from: MatchStatus,
    event: MatchEvent,
) -> Result<MatchStatus, InvalidTransition> {
    let next = match (from, event) {
        (MatchStatus::Upcoming, MatchEvent::Start) => MatchStatus::Live,
        (MatchStatus::Live, MatchEvent::Pause) => MatchStatus::Paused,
        (MatchStatus::Paused, MatchEvent::Resume) => MatchStatus::Live,
        (MatchStatus::Live | MatchStatus::Paused, MatchEvent::Complete) => MatchStatus::Completed,
        (from, event) => return Err(InvalidTransition { from, event }),
    };
    Ok(next)
}

/// Outcome of a requested notification status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange<S> {
    /// The notification already carries the requested status; nothing to write.
    Unchanged,
    /// The status moves to the contained value.
    Transition(S),
}

/// Error returned when a notification cannot move to the requested status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification cannot move from {} to {}", from.as_str(), to.as_str())]
pub struct InvalidStatusChange {
    pub from: NotificationStatus,
    pub to: NotificationStatus,
}

/// Validate a notification status change against the allowed table.
///
/// `accepted` and `declined` are terminal and nothing returns to `unread`.
pub fn plan_notification_status(
    from: NotificationStatus,
    to: NotificationStatus,
) -> Result<StatusChange<NotificationStatus>, InvalidStatusChange> {
    use NotificationStatus::*;

    if from == to {
        return Ok(StatusChange::Unchanged);
    }

    match (from, to) {
        (Unread, Read) | (Unread | Read, Accepted) | (Unread | Read, Declined) => {
            Ok(StatusChange::Transition(to))
        }
        _ => Err(InvalidStatusChange { from, to }),
    }
}

/// Error returned when an invitation cannot be revoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invitation is {} and cannot be revoked", from.as_str())]
pub struct InvalidRevocation {
    pub from: InvitationStatus,
}

/// Validate the revocation of an invitation currently in `from`.
pub fn plan_revocation(
    from: InvitationStatus,
) -> Result<StatusChange<InvitationStatus>, InvalidRevocation> {
    match from {
        InvitationStatus::Pending => Ok(StatusChange::Transition(InvitationStatus::Revoked)),
        InvitationStatus::Revoked => Ok(StatusChange::Unchanged),
        other => Err(InvalidRevocation { from: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_happy_path() {
        let live = next_match_status(MatchStatus::Upcoming, MatchEvent::Start).unwrap();
        assert_eq!(live, MatchStatus::Live);
        let paused = next_match_status(live, MatchEvent::Pause).unwrap();
        assert_eq!(paused, MatchStatus::Paused);
        let live = next_match_status(paused, MatchEvent::Resume).unwrap();
        assert_eq!(live, MatchStatus::Live);
        assert_eq!(
            next_match_status(live, MatchEvent::Complete).unwrap(),
            MatchStatus::Completed
        );
    }

    #[test]
    fn paused_match_can_complete() {
        assert_eq!(
            next_match_status(MatchStatus::Paused, MatchEvent::Complete).unwrap(),
            MatchStatus::Completed
        );
    }

    #[test]
    fn completed_match_rejects_every_event() {
        for event in [
            MatchEvent::Start,
            MatchEvent::Pause,
            MatchEvent::Resume,
            MatchEvent::Complete,
        ] {
            let err = next_match_status(MatchStatus::Completed, event).unwrap_err();
            assert_eq!(err.from, MatchStatus::Completed);
            assert_eq!(err.event, event);
        }
    }

    #[test]
    fn upcoming_match_cannot_complete() {
        let err = next_match_status(MatchStatus::Upcoming, MatchEvent::Complete).unwrap_err();
        assert_eq!(err.to_string(), "cannot complete a match that is upcoming");
    }

    #[test]
    fn notification_table() {
        use NotificationStatus::*;

        assert_eq!(
            plan_notification_status(Unread, Read),
            Ok(StatusChange::Transition(Read))
        );
        assert_eq!(
            plan_notification_status(Read, Accepted),
            Ok(StatusChange::Transition(Accepted))
        );
        assert_eq!(
            plan_notification_status(Unread, Declined),
            Ok(StatusChange::Transition(Declined))
        );
        assert_eq!(
            plan_notification_status(Accepted, Accepted),
            Ok(StatusChange::Unchanged)
        );
        assert!(plan_notification_status(Read, Unread).is_err());
        assert!(plan_notification_status(Accepted, Declined).is_err());
        assert!(plan_notification_status(Declined, Read).is_err());
    }

    #[test]
    fn revocation_table() {
        assert_eq!(
            plan_revocation(InvitationStatus::Pending),
            Ok(StatusChange::Transition(InvitationStatus::Revoked))
        );
        assert_eq!(
            plan_revocation(InvitationStatus::Revoked),
            Ok(StatusChange::Unchanged)
        );
        assert!(plan_revocation(InvitationStatus::Accepted).is_err());
    }
}
