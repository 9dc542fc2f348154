//! Polling data-fetching layer for Playkers front-ends.
//!
//! Mirrors what the views observe: the spectator refresh loop, the unread-count poll
//! with its toast, and the notification dropdown that auto-acknowledges accepted
//! bookings. Every poller owns its timers and stops when dropped.

mod api;
pub mod error;
pub mod feedback;
#[cfg(feature = "client")]
pub mod http;
pub mod notifications;
pub mod spectator;
#[cfg(test)]
mod testing;

use std::time::Duration;

use tokio::sync::watch;

pub use self::api::PlaykersApi;
pub use self::error::{ClientError, ClientResult};

/// Refresh intervals of the client pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Match, participants and roster refresh of the spectator view.
    pub spectator: Duration,
    /// Notification list refresh while the dropdown is open.
    pub notification_list: Duration,
    /// Unread count refresh while the app is in the foreground.
    pub unread_count: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            spectator: Duration::from_secs(5),
            notification_list: Duration::from_secs(15),
            unread_count: Duration::from_secs(30),
        }
    }
}

/// Update a poller control flag, waking its task only on an actual change.
fn set_flag(flag: &watch::Sender<bool>, value: bool) {
    flag.send_if_modified(|current| {
        let changed = *current != value;
        *current = value;
        changed
    });
}
