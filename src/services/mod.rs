/// Fetch-and-adapt of the person, winner and prize collections.
pub mod hydration_service;
/// Participant roster management against the remote service.
pub mod person_service;
/// Pushing prize edits to the remote and reconciling the cache.
pub mod prize_service;
/// Access key exchange and session lifecycle.
pub mod session_service;

use serde_json::Value;

use crate::{dao::activity_api::ActivityApiError, dto::envelope::Reply, error::ConsoleError};

/// Map a failed write call: HTTP rejections become [`ConsoleError::Sync`],
/// transport problems stay [`ConsoleError::Remote`].
pub(crate) fn write_error(err: ActivityApiError) -> ConsoleError {
    match err {
        ActivityApiError::RequestStatus { .. } => ConsoleError::Sync(err.user_message()),
        other => ConsoleError::Remote(other),
    }
}

/// Confirm a write body, surfacing a non-success envelope as [`ConsoleError::Sync`].
pub(crate) fn acknowledge(body: Value) -> Result<(), ConsoleError> {
    Reply::classify(body).into_ack()?;
    Ok(())
}
