use std::error::Error;

use thiserror::Error;

/// Result alias for client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures observed by the client. Only `Unauthorized` changes how it is surfaced.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered 401.
    #[error("unauthorized")]
    Unauthorized { message: Option<String> },
    /// The server answered with another non-success status.
    #[error("request to `{path}` failed with status {status}")]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },
    /// The request could not be sent or its body could not be read.
    #[error("request to `{path}` failed")]
    Request {
        path: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ClientError {
    /// Message returned by the server in its `{ "message": … }` body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { message } | ClientError::Status { message, .. } => {
                message.as_deref()
            }
            ClientError::Request { .. } => None,
        }
    }
}
