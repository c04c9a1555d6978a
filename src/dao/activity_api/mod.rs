pub mod error;
/// reqwest implementation of [`ActivityApi`].
#[cfg(feature = "http-api")]
pub mod http;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dto::{
    person::{CancelDrawPayload, DeletePersonsPayload, PersonListQuery, RemoveWinnerPayload},
    prize::PrizeWritePayload,
};

pub use error::{ActivityApiError, ApiResult};

/// File sent to the roster import endpoint.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name reported to the remote.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Remote activity service consumed by the console.
///
/// JSON endpoints hand back the raw body so callers can decode either the
/// enveloped or the bare shape; download endpoints return the file bytes.
pub trait ActivityApi: Send + Sync {
    /// Trade an access key for a token and activity scope.
    fn exchange_token(&self, access_key: &str) -> BoxFuture<'static, ApiResult<Value>>;
    /// Roster of one activity, optionally filtered.
    fn list_persons(&self, query: PersonListQuery) -> BoxFuture<'static, ApiResult<Value>>;
    /// Winners of the token's activity.
    fn list_winners(&self) -> BoxFuture<'static, ApiResult<Value>>;
    /// Prize pools of one activity.
    fn list_prizes(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>>;
    /// Create a prize pool.
    fn create_prize(&self, payload: PrizeWritePayload) -> BoxFuture<'static, ApiResult<Value>>;
    /// Overwrite prize `id`.
    fn update_prize(
        &self,
        id: i64,
        payload: PrizeWritePayload,
    ) -> BoxFuture<'static, ApiResult<Value>>;
    /// Mark prize `id` as drawn out.
    fn mark_prize_ended(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>>;
    /// Open or close prize `id` to every participant.
    fn set_prize_for_all(&self, id: i64, for_all: bool) -> BoxFuture<'static, ApiResult<Value>>;
    /// Delete prize `id`.
    fn delete_prize(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>>;
    /// Upload a roster spreadsheet.
    fn import_persons(&self, scope_id: i64, file: Upload) -> BoxFuture<'static, ApiResult<Value>>;
    /// Roster spreadsheet.
    fn export_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>>;
    /// Delete people by lottery code.
    fn delete_persons(&self, payload: DeletePersonsPayload)
    -> BoxFuture<'static, ApiResult<Value>>;
    /// Clear sign-in and draw state of the whole roster.
    fn reset_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>>;
    /// Strip one person's winner status.
    fn remove_winner(&self, payload: RemoveWinnerPayload) -> BoxFuture<'static, ApiResult<Value>>;
    /// Winner spreadsheet.
    fn export_winners(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>>;
    /// Undo a draw for the given people.
    fn cancel_draw(&self, payload: CancelDrawPayload) -> BoxFuture<'static, ApiResult<Value>>;
    /// Blank roster import template.
    fn download_template(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>>;
}
