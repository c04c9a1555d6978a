//! Error types shared by every [`ActivityApi`](super::ActivityApi) implementation.

use std::error::Error;

use thiserror::Error;

/// Convenient result alias returning [`ActivityApiError`] failures.
pub type ApiResult<T> = Result<T, ActivityApiError>;

type BoxedSource = Box<dyn Error + Send + Sync>;

/// Failures that can occur while talking to the activity service.
#[derive(Debug, Error)]
pub enum ActivityApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build activity API client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
    /// A request could not be sent or its body could not be read.
    #[error("failed to send activity API request to `{path}`")]
    RequestSend {
        /// Endpoint path.
        path: String,
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
    /// The service answered with a non-success HTTP status.
    #[error("unexpected activity API response status {status} for `{path}`")]
    RequestStatus {
        /// Endpoint path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: Option<String>,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode activity API response for `{path}`")]
    DecodeResponse {
        /// Endpoint path.
        path: String,
        /// Underlying error.
        #[source]
        source: BoxedSource,
    },
}

impl ActivityApiError {
    /// Transport failure on `path`.
    pub fn send(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ActivityApiError::RequestSend {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Undecodable body from `path`.
    pub fn decode(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ActivityApiError::DecodeResponse {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Human readable reason, preferring the message the service attached.
    pub fn user_message(&self) -> String {
        match self {
            ActivityApiError::RequestStatus {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}
