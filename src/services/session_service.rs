//! Access key to session transition.
//!
//! A new access key wipes every durable session field and both caches before
//! anything goes over the network, so data from one activity never leaks into
//! another. Partial progress is not rolled back on failure.

use tracing::{debug, error, info};

use crate::{
    dao::activity_api::ActivityApiError,
    dto::envelope::decode_session_grant,
    error::ConsoleError,
    services::hydration_service::{self, HydrationSummary},
    state::{BootstrapStatus, Notice, SharedState},
};

/// Result of [`bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No access key was supplied; the stored session was left alone.
    NotApplicable,
    /// Session established and caches hydrated.
    Ready {
        scope_id: i64,
        summary: HydrationSummary,
    },
}

/// Exchange `access_key` for a session and hydrate the caches.
///
/// Without an access key this is a no-op. On failure the error is logged,
/// published as a notice and recorded in the bootstrap status before being
/// returned; the caller is expected to leave the console after
/// [`AppConfig::redirect_delay`](crate::config::AppConfig::redirect_delay).
pub async fn bootstrap(
    state: &SharedState,
    access_key: Option<&str>,
) -> Result<BootstrapOutcome, ConsoleError> {
    let Some(access_key) = access_key.filter(|key| !key.is_empty()) else {
        debug!("no access key supplied; session left untouched");
        return Ok(BootstrapOutcome::NotApplicable);
    };

    state.set_status(BootstrapStatus::Loading);
    match establish(state, access_key).await {
        Ok((scope_id, summary)) => {
            state.set_status(BootstrapStatus::Ready { scope_id });
            info!(scope_id, "console session ready");
            Ok(BootstrapOutcome::Ready { scope_id, summary })
        }
        Err(err) => {
            error!(error = %err, "console bootstrap failed");
            let message = err.to_string();
            state.set_status(BootstrapStatus::Failed {
                message: message.clone(),
            });
            state.notify(Notice::error(message));
            Err(err)
        }
    }
}

async fn establish(
    state: &SharedState,
    access_key: &str,
) -> Result<(i64, HydrationSummary), ConsoleError> {
    let session = state.session();

    let previous = session.access_key().await?;
    if previous.as_deref() != Some(access_key) {
        info!(
            had_previous = previous.is_some(),
            "access key changed; wiping session and cached collections"
        );
        session.clear().await?;
        state.reset_caches().await;
    }
    session.set_access_key(access_key).await?;

    debug!("exchanging access key for a session token");
    let body = state
        .api()
        .exchange_token(access_key)
        .await
        .map_err(exchange_error)?;
    let grant = decode_session_grant(&body)?;

    session.set_token(&grant.token).await?;
    session.set_scope_id(grant.scope_id).await?;
    info!(scope_id = grant.scope_id, "session token granted");

    let summary = hydration_service::hydrate(state, grant.scope_id).await?;
    Ok((grant.scope_id, summary))
}

/// The service refusing the key is a session problem; anything else is transport.
fn exchange_error(err: ActivityApiError) -> ConsoleError {
    match err {
        ActivityApiError::RequestStatus { .. } => ConsoleError::Session(err.user_message()),
        other => ConsoleError::Remote(other),
    }
}

/// Hydrate from the stored session, if one is established.
///
/// Returns `Ok(None)` when no token or scope is stored.
pub async fn resume(state: &SharedState) -> Result<Option<HydrationSummary>, ConsoleError> {
    let Some(session) = state.session().session().await? else {
        debug!("no stored session to resume");
        return Ok(None);
    };

    state.set_status(BootstrapStatus::Loading);
    match hydration_service::hydrate(state, session.scope_id).await {
        Ok(summary) => {
            state.set_status(BootstrapStatus::Ready {
                scope_id: session.scope_id,
            });
            Ok(Some(summary))
        }
        Err(err) => {
            error!(scope_id = session.scope_id, error = %err, "resuming stored session failed");
            let message = err.to_string();
            state.set_status(BootstrapStatus::Failed {
                message: message.clone(),
            });
            state.notify(Notice::error(message));
            Err(err)
        }
    }
}
