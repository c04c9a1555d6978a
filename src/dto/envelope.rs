//! Response envelope handling.
//!
//! The activity service normally wraps payloads as `{code, message, data}`
//! with `code == 200` meaning success, but some endpoints answer with the bare
//! payload. Both shapes are decoded explicitly here instead of reading fields
//! optimistically.

use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;

/// Status code the service uses for success inside the envelope.
pub const SUCCESS_CODE: i64 = 200;

/// Code reported for an envelope whose own `code` could not be read.
pub const UNREADABLE_CODE: i64 = -1;

/// Remote reported a failure inside an otherwise well-formed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote rejected request (code {code}): {message}")]
pub struct Rejection {
    /// Envelope code, never [`SUCCESS_CODE`].
    pub code: i64,
    /// Remote message, or a generic one when it sent none.
    pub message: String,
}

/// Standard `{code, message, data}` wrapper.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Status code; [`SUCCESS_CODE`] means success.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub code: i64,
    /// Human readable status.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload, absent on some failures and empty writes.
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Whether `code` is [`SUCCESS_CODE`].
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// A response body classified by shape.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `{code, message, data}` form.
    Enveloped(ApiEnvelope<Value>),
    /// Object carrying a `code` key that does not decode as an envelope.
    Unreadable(Rejection),
    /// Payload returned directly without the wrapper.
    Bare(Value),
}

impl Reply {
    /// Classify a body: any object carrying a `code` key is an envelope, and
    /// one that fails to decode as such is never taken for a bare payload.
    pub fn classify(body: Value) -> Self {
        let Some(code) = body.as_object().and_then(|map| map.get("code")).cloned() else {
            return Reply::Bare(body);
        };
        match serde_json::from_value::<ApiEnvelope<Value>>(body) {
            Ok(envelope) => Reply::Enveloped(envelope),
            Err(err) => Reply::Unreadable(Rejection {
                code: UNREADABLE_CODE,
                message: format!("unreadable response envelope (code `{code}`): {err}"),
            }),
        }
    }

    /// Payload of a successful reply; `Null` when an envelope omitted `data`.
    pub fn into_data(self) -> Result<Value, Rejection> {
        match self {
            Reply::Enveloped(envelope) if envelope.is_success() => {
                Ok(envelope.data.unwrap_or(Value::Null))
            }
            Reply::Enveloped(envelope) => Err(Rejection {
                code: envelope.code,
                message: envelope
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "request failed".into()),
            }),
            Reply::Unreadable(rejection) => Err(rejection),
            Reply::Bare(value) => Ok(value),
        }
    }

    /// Succeeds when the remote confirmed the write; bare bodies count as confirmation.
    pub fn into_ack(self) -> Result<(), Rejection> {
        self.into_data().map(|_| ())
    }
}

/// Token and scope granted in exchange for an access key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Bearer token.
    pub token: String,
    /// Activity lottery id.
    pub scope_id: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
struct TokenPayload {
    token: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    activity_lottery_id: Option<i64>,
}

impl TokenPayload {
    fn into_grant(self) -> Option<SessionGrant> {
        let token = self.token.filter(|t| !t.is_empty())?;
        let scope_id = self.activity_lottery_id.filter(|id| *id != 0)?;
        Some(SessionGrant { token, scope_id })
    }
}

/// Token-exchange response decoded as one of its two accepted shapes.
#[derive(Debug, Clone)]
enum TokenResponse {
    Enveloped(ApiEnvelope<TokenPayload>),
    Flat(TokenPayload),
}

/// Reason a token-exchange body did not yield a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing token or scope")]
pub struct MissingGrant {
    /// Message the remote attached, if any.
    pub remote_message: Option<String>,
}

/// Extract a [`SessionGrant`] from a token-exchange body.
///
/// The enveloped schema is tried first and only counts when `code == 200`
/// and `data` carries both fields; otherwise the flat schema
/// (`{token, valid_to, activity_lottery_id}`) is tried. Neither matching is
/// an error.
pub fn decode_session_grant(body: &Value) -> Result<SessionGrant, MissingGrant> {
    let mut remote_message = None;

    let candidates = [
        serde_json::from_value::<ApiEnvelope<TokenPayload>>(body.clone())
            .ok()
            .map(TokenResponse::Enveloped),
        serde_json::from_value::<TokenPayload>(body.clone())
            .ok()
            .map(TokenResponse::Flat),
    ];

    for candidate in candidates.into_iter().flatten() {
        let grant = match candidate {
            TokenResponse::Enveloped(envelope) => {
                if remote_message.is_none() {
                    remote_message = envelope.message.clone().filter(|m| !m.is_empty());
                }
                if !envelope.is_success() {
                    continue;
                }
                envelope.data.and_then(TokenPayload::into_grant)
            }
            TokenResponse::Flat(payload) => payload.into_grant(),
        };
        if let Some(grant) = grant {
            return Ok(grant);
        }
    }

    Err(MissingGrant { remote_message })
}
