//! Wire shapes exchanged with the activity service and their mapping to
//! local state.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod common;
pub mod envelope;
pub mod person;
pub mod prize;

/// RFC 3339 rendering used for every locally generated timestamp.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Current time in the same format the remote service uses for record timestamps.
pub(crate) fn now_timestamp() -> String {
    format_system_time(SystemTime::now())
}
