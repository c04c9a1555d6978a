//! Pushes prize edits to the remote service.
//!
//! Every write is followed by a reconciliation fetch that rebuilds the whole
//! prize cache, so server-side recomputation (remaining counts, sort order)
//! always wins over the local copy.

use futures::future::join_all;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::activity_api::ActivityApi,
    dto::prize::PrizeWritePayload,
    error::ConsoleError,
    services::{acknowledge, hydration_service::fetch_prizes, write_error},
    state::{Notice, SharedState, prize::PrizeConfig},
};

/// Outcome of [`delete_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Prizes the remote confirmed as deleted.
    pub deleted: Vec<i64>,
    /// Prizes that could not be deleted, with the reason.
    pub failed: Vec<(i64, String)>,
}

impl DeleteSummary {
    /// Whether every prize was deleted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-fetch the prize list and replace the cache; returns the new size.
pub async fn refresh_prizes(state: &SharedState) -> Result<usize, ConsoleError> {
    let scope_id = state.require_scope().await?;
    reconcile(state, scope_id).await
}

async fn reconcile(state: &SharedState, scope_id: i64) -> Result<usize, ConsoleError> {
    let prizes = fetch_prizes(state.api().as_ref(), scope_id)
        .await
        .inspect_err(|err| warn!(scope_id, error = %err, "prize reconciliation failed"))?;
    let mut board = state.prizes_mut().await;
    board.replace_all(prizes);
    debug!(scope_id, prizes = board.len(), "prize cache rebuilt");
    Ok(board.len())
}

async fn push_update(
    api: &dyn ActivityApi,
    scope_id: i64,
    prize: &PrizeConfig,
) -> Result<(), ConsoleError> {
    let payload = PrizeWritePayload::update(prize, scope_id);
    payload.validate()?;
    let body = api
        .update_prize(prize.id, payload)
        .await
        .map_err(write_error)?;
    acknowledge(body)
}

/// Publish the outcome of a write as a notice and pass it through.
fn announce<T>(
    state: &SharedState,
    result: Result<T, ConsoleError>,
    success: impl FnOnce(&T) -> String,
) -> Result<T, ConsoleError> {
    match &result {
        Ok(value) => state.notify(Notice::success(success(value))),
        Err(err) => state.notify(Notice::error(err.to_string())),
    }
    result
}

/// Save one prize, then reconcile the prize cache.
pub async fn save_one(state: &SharedState, prize: &PrizeConfig) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        push_update(state.api().as_ref(), scope_id, prize)
            .await
            .inspect_err(|err| warn!(prize_id = prize.id, error = %err, "prize update rejected"))?;
        info!(scope_id, prize_id = prize.id, "prize saved");
        reconcile(state, scope_id).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;
    announce(state, result, |_| "Prize saved".to_string())
}

/// Save every cached prize concurrently.
///
/// The reconciliation fetch always runs once all updates have settled, even
/// when some of them failed; successful writes are never rolled back. The
/// first failure is reported for the whole batch.
pub async fn save_all(state: &SharedState) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        let prizes = state.prizes().await.to_vec();
        let api = state.api();

        let outcomes = join_all(
            prizes
                .iter()
                .map(|prize| push_update(api.as_ref(), scope_id, prize)),
        )
        .await;

        let mut failures = prizes
            .iter()
            .zip(outcomes)
            .filter_map(|(prize, outcome)| outcome.err().map(|err| (prize.id, err)))
            .collect::<Vec<_>>();
        let reconciled = reconcile(state, scope_id).await;

        if failures.is_empty() {
            info!(scope_id, prizes = prizes.len(), "all prizes saved");
            return reconciled.map(|_| ());
        }

        for (prize_id, err) in &failures {
            warn!(scope_id, prize_id, error = %err, "prize update failed during batch save");
        }
        let total = failures.len();
        let (prize_id, first) = failures.swap_remove(0);
        Err(ConsoleError::Sync(format!(
            "{total} of {} prizes failed to save; prize {prize_id}: {first}",
            prizes.len()
        )))
    }
    .await;
    announce(state, result, |_| "All prizes saved".to_string())
}

/// Delete every cached prize one after another, then reconcile.
///
/// Failures do not stop the sweep. A single summary notice is published.
pub async fn delete_all(state: &SharedState) -> Result<DeleteSummary, ConsoleError> {
    let scope_id = match state.require_scope().await {
        Ok(scope_id) => scope_id,
        Err(err) => {
            state.notify(Notice::error(err.to_string()));
            return Err(err);
        }
    };
    let ids = state.prizes().await.ids();
    let api = state.api();

    let mut summary = DeleteSummary::default();
    for id in ids {
        let outcome = match api.delete_prize(id).await {
            Ok(body) => acknowledge(body),
            Err(err) => Err(write_error(err)),
        };
        match outcome {
            Ok(()) => summary.deleted.push(id),
            Err(err) => {
                warn!(scope_id, prize_id = id, error = %err, "prize delete failed");
                summary.failed.push((id, err.to_string()));
            }
        }
    }

    let reconciled = reconcile(state, scope_id).await;
    info!(
        scope_id,
        deleted = summary.deleted.len(),
        failed = summary.failed.len(),
        "prize sweep finished"
    );

    if summary.is_complete() {
        state.notify(Notice::success(format!(
            "Deleted {} prizes",
            summary.deleted.len()
        )));
    } else {
        state.notify(Notice::error(format!(
            "Deleted {} prizes, {} failed",
            summary.deleted.len(),
            summary.failed.len()
        )));
    }

    reconciled?;
    Ok(summary)
}

/// Create a placeholder prize named after the configured default, then reconcile.
pub async fn add_prize(state: &SharedState) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        let payload =
            PrizeWritePayload::placeholder(scope_id, state.config().default_prize_name.clone());
        payload.validate()?;
        let body = state
            .api()
            .create_prize(payload)
            .await
            .map_err(write_error)?;
        acknowledge(body)?;
        info!(scope_id, "prize created");
        reconcile(state, scope_id).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;
    announce(state, result, |_| "Prize added".to_string())
}

/// Delete a single prize, then reconcile.
pub async fn delete_prize(state: &SharedState, id: i64) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        let body = state.api().delete_prize(id).await.map_err(write_error)?;
        acknowledge(body)?;
        info!(scope_id, prize_id = id, "prize deleted");
        reconcile(state, scope_id).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;
    announce(state, result, |_| "Prize deleted".to_string())
}

/// Mark a prize as drawn out on the remote, then reconcile.
pub async fn mark_prize_ended(state: &SharedState, id: i64) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        let body = state
            .api()
            .mark_prize_ended(id)
            .await
            .map_err(write_error)?;
        acknowledge(body)?;
        info!(scope_id, prize_id = id, "prize marked as ended");
        reconcile(state, scope_id).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;
    announce(state, result, |_| "Prize marked as ended".to_string())
}

/// Toggle whether everyone may draw `id`, then reconcile.
pub async fn set_prize_for_all(
    state: &SharedState,
    id: i64,
    for_all: bool,
) -> Result<(), ConsoleError> {
    let result = async {
        let scope_id = state.require_scope().await?;
        let body = state
            .api()
            .set_prize_for_all(id, for_all)
            .await
            .map_err(write_error)?;
        acknowledge(body)?;
        info!(scope_id, prize_id = id, for_all, "prize eligibility updated");
        reconcile(state, scope_id).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;
    announce(state, result, |_| "Prize updated".to_string())
}
