//! Backend-neutral storage errors.

use std::error::Error as StdError;

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a [`PlaykersStore`](crate::dao::store::PlaykersStore) backend.
///
/// A lost compare-and-set is not an error: `replace_*` calls report it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("store unreachable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// An insert collided with an existing application id.
    #[error("`{collection}` already holds a document with id `{id}`")]
    Duplicate { collection: &'static str, id: String },
}

impl StorageError {
    pub fn unavailable(message: String, source: impl StdError + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
