use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by durable key-value backends regardless of where they keep their data.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored value could not be interpreted.
    #[error("stored value for `{key}` is corrupt: {detail}")]
    Corrupt {
        /// Key holding the bad value.
        key: String,
        /// What was wrong with it.
        detail: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Durable string key-value store holding the console session scalars.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`; absent keys are not an error.
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove every key.
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
}
