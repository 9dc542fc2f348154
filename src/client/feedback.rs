use std::time::Duration;

use crate::client::ClientError;

/// Toast shown when a failure carries no server message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
/// Toast shown before sending the user back to the login page.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const LOGIN_PATH: &str = "/login";
/// Delay between the session-expired toast and the login redirect.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_millis(1_500);

/// What the user sees after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Toast { message: String },
    /// Toast, then navigate to `to` once `after` has elapsed.
    RedirectToLogin {
        message: String,
        to: &'static str,
        after: Duration,
    },
}

impl Feedback {
    pub fn toast(message: impl Into<String>) -> Self {
        Feedback::Toast {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Feedback::Toast { message } | Feedback::RedirectToLogin { message, .. } => message,
        }
    }
}

/// Map a failed call to the feedback shown to the user. Nothing is retried.
pub fn feedback_for_error(err: &ClientError) -> Feedback {
    match err {
        ClientError::Unauthorized { .. } => Feedback::RedirectToLogin {
            message: SESSION_EXPIRED_MESSAGE.to_owned(),
            to: LOGIN_PATH,
            after: LOGIN_REDIRECT_DELAY,
        },
        other => Feedback::toast(other.server_message().unwrap_or(GENERIC_ERROR_MESSAGE)),
    }
}
