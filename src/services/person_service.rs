//! Participant roster management.
//!
//! Mutations go to the remote first; on success the roster cache is rebuilt
//! from a fresh fetch rather than patched locally.

use tracing::{debug, info, warn};

use crate::{
    dao::activity_api::Upload,
    dto::person::{CancelDrawPayload, DeletePersonsPayload, PersonFilter, RemoveWinnerPayload},
    error::ConsoleError,
    services::{acknowledge, hydration_service::fetch_persons, prize_service, write_error},
    state::{Notice, SharedState},
};

/// Re-fetch the roster matching `filter` and replace the cache with it.
pub async fn refresh_persons(
    state: &SharedState,
    filter: PersonFilter,
) -> Result<usize, ConsoleError> {
    let scope_id = state.require_scope().await?;
    reconcile(state, scope_id, filter).await
}

async fn reconcile(
    state: &SharedState,
    scope_id: i64,
    filter: PersonFilter,
) -> Result<usize, ConsoleError> {
    let persons = fetch_persons(state.api().as_ref(), scope_id, filter)
        .await
        .inspect_err(|err| warn!(scope_id, error = %err, "roster refresh failed"))?;
    let mut roster = state.persons_mut().await;
    roster.replace_all(persons);
    debug!(scope_id, persons = roster.len(), "roster cache rebuilt");
    Ok(roster.len())
}

/// Run a roster write, then rebuild the unfiltered roster and publish the outcome.
async fn write_and_reconcile<F, Fut>(
    state: &SharedState,
    success: &str,
    write: F,
) -> Result<(), ConsoleError>
where
    F: FnOnce(i64) -> Fut,
    Fut: Future<Output = Result<(), ConsoleError>>,
{
    let result = async {
        let scope_id = state.require_scope().await?;
        write(scope_id).await?;
        reconcile(state, scope_id, PersonFilter::default()).await?;
        Ok::<(), ConsoleError>(())
    }
    .await;

    match &result {
        Ok(()) => state.notify(Notice::success(success)),
        Err(err) => {
            warn!(error = %err, "roster update failed");
            state.notify(Notice::error(err.to_string()));
        }
    }
    result
}

/// Upload a roster spreadsheet for the current activity.
pub async fn import_persons(
    state: &SharedState,
    file_name: impl Into<String>,
    bytes: Vec<u8>,
) -> Result<(), ConsoleError> {
    let upload = Upload {
        file_name: file_name.into(),
        bytes,
    };
    if upload.bytes.is_empty() {
        return Err(ConsoleError::InvalidInput("import file is empty".into()));
    }

    write_and_reconcile(state, "Roster imported", move |scope_id| async move {
        info!(scope_id, file = %upload.file_name, size = upload.bytes.len(), "importing roster");
        let body = state
            .api()
            .import_persons(scope_id, upload)
            .await
            .map_err(write_error)?;
        acknowledge(body)
    })
    .await
}

/// Delete one person by lottery code.
pub async fn delete_person(state: &SharedState, code: &str) -> Result<(), ConsoleError> {
    let codes = vec![code.to_string()];
    write_and_reconcile(state, "Person deleted", move |scope_id| async move {
        delete_codes(state, scope_id, codes).await
    })
    .await
}

/// Delete every cached person. Returns how many codes were sent; zero when
/// the roster cache is empty, in which case nothing is sent.
pub async fn delete_all_persons(state: &SharedState) -> Result<usize, ConsoleError> {
    let codes = state.persons().await.remote_codes();
    if codes.is_empty() {
        state.notify(Notice::info("No persons to delete"));
        return Ok(0);
    }

    let count = codes.len();
    write_and_reconcile(state, "All persons deleted", move |scope_id| async move {
        delete_codes(state, scope_id, codes).await
    })
    .await?;
    Ok(count)
}

async fn delete_codes(
    state: &SharedState,
    scope_id: i64,
    lottery_codes: Vec<String>,
) -> Result<(), ConsoleError> {
    info!(scope_id, count = lottery_codes.len(), "deleting persons");
    let body = state
        .api()
        .delete_persons(DeletePersonsPayload {
            activity_lottery_id: scope_id,
            lottery_codes,
        })
        .await
        .map_err(write_error)?;
    acknowledge(body)
}

/// Clear sign-in and draw state for every person of the activity.
pub async fn reset_persons(state: &SharedState) -> Result<(), ConsoleError> {
    write_and_reconcile(state, "Roster reset", move |scope_id| async move {
        info!(scope_id, "resetting roster");
        let body = state
            .api()
            .reset_persons(scope_id)
            .await
            .map_err(write_error)?;
        acknowledge(body)
    })
    .await
}

/// Strip the winner status of one person.
pub async fn remove_winner(state: &SharedState, code: &str) -> Result<(), ConsoleError> {
    let lottery_code = code.to_string();
    write_and_reconcile(state, "Winner removed", move |scope_id| async move {
        info!(scope_id, code = %lottery_code, "removing winner");
        let body = state
            .api()
            .remove_winner(RemoveWinnerPayload {
                activity_lottery_id: scope_id,
                lottery_code,
            })
            .await
            .map_err(write_error)?;
        acknowledge(body)
    })
    .await
}

/// Undo the draw of `prize_id` for the given persons.
///
/// Cancelling gives units back to the prize pool, so the prize cache is
/// rebuilt as well once the roster has been.
pub async fn cancel_draw(
    state: &SharedState,
    prize_id: i64,
    codes: Vec<String>,
) -> Result<(), ConsoleError> {
    if codes.is_empty() {
        return Err(ConsoleError::InvalidInput(
            "cancelling a draw needs at least one lottery code".into(),
        ));
    }

    write_and_reconcile(state, "Draw cancelled", move |scope_id| async move {
        info!(scope_id, prize_id, count = codes.len(), "cancelling draw");
        let body = state
            .api()
            .cancel_draw(CancelDrawPayload {
                activity_lottery_id: scope_id,
                prize_id,
                lottery_codes: codes,
            })
            .await
            .map_err(write_error)?;
        acknowledge(body)
    })
    .await?;
    prize_service::refresh_prizes(state).await?;
    Ok(())
}

/// Roster export for the current activity as the raw spreadsheet bytes.
pub async fn export_persons(state: &SharedState) -> Result<Vec<u8>, ConsoleError> {
    let scope_id = state.require_scope().await?;
    let bytes = state.api().export_persons(scope_id).await?;
    debug!(scope_id, size = bytes.len(), "roster exported");
    Ok(bytes)
}

/// Winner export for the current activity as the raw spreadsheet bytes.
pub async fn export_winners(state: &SharedState) -> Result<Vec<u8>, ConsoleError> {
    let scope_id = state.require_scope().await?;
    let bytes = state.api().export_winners(scope_id).await?;
    debug!(scope_id, size = bytes.len(), "winners exported");
    Ok(bytes)
}

/// Blank import template; does not need an established scope.
pub async fn download_template(state: &SharedState) -> Result<Vec<u8>, ConsoleError> {
    let bytes = state.api().download_template().await?;
    debug!(size = bytes.len(), "import template downloaded");
    Ok(bytes)
}
