use thiserror::Error;

use crate::{
    dao::{activity_api::ActivityApiError, storage::StorageError},
    dto::{
        envelope::{MissingGrant, Rejection},
        prize::MalformedPrize,
    },
    state::prize::AllocationError,
};

/// Collections fetched during hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Full roster.
    Persons,
    /// Winner list.
    Winners,
    /// Prize pools.
    Prizes,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Resource::Persons => "persons",
            Resource::Winners => "winners",
            Resource::Prizes => "prizes",
        })
    }
}

/// A fetch-and-adapt step failed; the cached collections were left untouched.
#[derive(Debug, Error)]
pub enum HydrationError {
    /// The fetch itself failed.
    #[error("failed to fetch {resource}: {}", .source.user_message())]
    Fetch {
        /// Collection being fetched.
        resource: Resource,
        /// Transport or status failure.
        #[source]
        source: ActivityApiError,
    },
    /// The remote answered with a non-success envelope.
    #[error("remote rejected {resource} fetch: {}", .source.message)]
    Rejected {
        /// Collection being fetched.
        resource: Resource,
        /// Code and message the remote sent.
        #[source]
        source: Rejection,
    },
    /// The payload did not match the expected shape.
    #[error("malformed {resource} payload: {detail}")]
    Malformed {
        /// Collection whose payload was malformed.
        resource: Resource,
        /// Decoder message.
        detail: String,
    },
}

impl HydrationError {
    /// Collection the failure concerns.
    pub fn resource(&self) -> Resource {
        match self {
            HydrationError::Fetch { resource, .. }
            | HydrationError::Rejected { resource, .. }
            | HydrationError::Malformed { resource, .. } => *resource,
        }
    }
}

impl From<MalformedPrize> for HydrationError {
    fn from(err: MalformedPrize) -> Self {
        HydrationError::Malformed {
            resource: Resource::Prizes,
            detail: err.to_string(),
        }
    }
}

/// Errors surfaced by console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Access key rejected, or the exchange yielded no token/scope.
    #[error("session error: {0}")]
    Session(String),
    /// Hydration failed; previous cache contents remain authoritative.
    #[error("hydration failed: {0}")]
    Hydration(#[from] HydrationError),
    /// A create, update or delete was rejected by the remote.
    #[error("sync failed: {0}")]
    Sync(String),
    /// The operation needs an established activity scope.
    #[error("missing activity_lottery_id")]
    MissingScope,
    /// Durable session storage failed.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
    /// Invalid input provided by the operator.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The remote could not be reached.
    #[error("activity service unavailable: {}", .0.user_message())]
    Remote(#[from] ActivityApiError),
}

impl From<MissingGrant> for ConsoleError {
    fn from(err: MissingGrant) -> Self {
        match &err.remote_message {
            Some(message) => ConsoleError::Session(format!("{err} ({message})")),
            None => ConsoleError::Session(err.to_string()),
        }
    }
}

impl From<Rejection> for ConsoleError {
    fn from(err: Rejection) -> Self {
        ConsoleError::Sync(err.message)
    }
}

impl From<AllocationError> for ConsoleError {
    fn from(err: AllocationError) -> Self {
        ConsoleError::InvalidInput(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ConsoleError {
    fn from(err: validator::ValidationErrors) -> Self {
        ConsoleError::InvalidInput(format!("validation failed: {}", err))
    }
}
