//! Wire shapes for the prize endpoints and their mapping to [`PrizeConfig`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;
use validator::Validate;

use crate::{
    dto::common::lenient_i64,
    state::prize::{AllocationBucket, AllocationSpec, PrizeConfig},
};

/// Separator of the `each_lottery_limit` column.
pub const LIMIT_SEPARATOR: &str = ",";
/// `each_lottery_limit` sent when a prize has no allocation buckets.
pub const DEFAULT_LIMIT: &str = "1";
/// Prize level the console always writes.
pub const DEFAULT_LEVEL: u8 = 1;

/// Remote `is_end` column.
///
/// The column is string typed and the service marks a prize as drawn out
/// with the literal `"0"`. The mapping is kept exact rather than inferred
/// from truthiness:
///
/// | wire value            | flag    | `exhausted` |
/// |-----------------------|---------|-------------|
/// | `"0"`                 | `Ended` | `true`      |
/// | any other string      | `Open`  | `false`     |
/// | number, null, missing | `Open`  | `false`     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndFlag {
    /// Drawn out.
    Ended,
    /// Still drawable.
    Open,
}

impl EndFlag {
    const ENDED_WIRE: &'static str = "0";

    /// Read the raw `is_end` column.
    pub fn from_wire(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(text)) if text == Self::ENDED_WIRE => EndFlag::Ended,
            _ => EndFlag::Open,
        }
    }

    /// Whether the prize is drawn out.
    pub fn is_exhausted(self) -> bool {
        matches!(self, EndFlag::Ended)
    }
}

/// Prize entry as returned by `prize/list`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct PrizeRecordWire {
    /// Remote prize id, numeric or numeric string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    /// Display name.
    pub name: Option<String>,
    /// Listing position.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub sort: Option<i32>,
    /// `1` when every participant is eligible.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub is_all: Option<i64>,
    /// Pool size.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub total: Option<i64>,
    /// Units left, loosely typed.
    pub remaining: Option<Value>,
    /// Image URL.
    pub image: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Drawn-out column, see [`EndFlag`].
    pub is_end: Option<Value>,
    /// Comma separated bucket draw counts.
    pub each_lottery_limit: Option<String>,
}

/// A prize record that cannot be represented locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prize `{id}` is malformed: {detail}")]
pub struct MalformedPrize {
    /// Offending prize id.
    pub id: i64,
    /// What could not be read.
    pub detail: String,
}

/// Split an `each_lottery_limit` string into buckets, one per comma separated segment.
pub fn parse_limit_buckets(limit: &str) -> Result<Vec<AllocationBucket>, String> {
    if limit.trim().is_empty() {
        return Ok(Vec::new());
    }

    limit
        .split(LIMIT_SEPARATOR)
        .enumerate()
        .map(|(index, segment)| {
            segment
                .trim()
                .parse::<u32>()
                .map(|draw_count| AllocationBucket::new(index.to_string(), draw_count))
                .map_err(|err| format!("bad draw limit segment `{segment}`: {err}"))
        })
        .collect()
}

/// Inverse of [`parse_limit_buckets`]; an empty list encodes as [`DEFAULT_LIMIT`].
pub fn format_limit_buckets(buckets: &[AllocationBucket]) -> String {
    if buckets.is_empty() {
        return DEFAULT_LIMIT.to_string();
    }
    buckets
        .iter()
        .map(|bucket| bucket.draw_count.to_string())
        .collect::<Vec<_>>()
        .join(LIMIT_SEPARATOR)
}

impl TryFrom<PrizeRecordWire> for PrizeConfig {
    type Error = MalformedPrize;

    fn try_from(wire: PrizeRecordWire) -> Result<Self, Self::Error> {
        let id = wire.id;
        let total = wire.total.unwrap_or(0);
        let total_count = u32::try_from(total).map_err(|_| MalformedPrize {
            id,
            detail: format!("total `{total}` is out of range"),
        })?;

        // used = total - remaining, kept within [0, total]; a missing,
        // unreadable or out-of-range remaining count reads as nothing used.
        let used_count = wire
            .remaining
            .as_ref()
            .and_then(lenient_i64)
            .and_then(|remaining| total.checked_sub(remaining))
            .map(|used| used.clamp(0, total))
            .unwrap_or(0) as u32;

        let buckets = match wire.each_lottery_limit.as_deref() {
            Some(limit) => {
                parse_limit_buckets(limit).map_err(|detail| MalformedPrize { id, detail })?
            }
            None => Vec::new(),
        };

        Ok(Self {
            id,
            name: wire.name.unwrap_or_default(),
            sort_order: wire.sort.unwrap_or(0),
            eligible_for_all: wire.is_all == Some(1),
            total_count,
            used_count,
            image: wire.image.unwrap_or_default(),
            description: wire.description.unwrap_or_default(),
            exhausted: EndFlag::from_wire(wire.is_end.as_ref()).is_exhausted(),
            allocation: AllocationSpec {
                enabled: true,
                buckets,
            },
        })
    }
}

/// Prize list payload: `data.prizes`, else `data.list`, else a bare array.
pub fn prize_entries(data: &Value) -> Vec<Value> {
    data.get("prizes")
        .and_then(Value::as_array)
        .or_else(|| data.get("list").and_then(Value::as_array))
        .or_else(|| data.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Body of `prize/create` and `prize/update/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct PrizeWritePayload {
    /// Prize id; absent on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Owning activity.
    pub activity_lottery_id: i64,
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Image URL.
    pub image: String,
    /// Description.
    pub description: String,
    /// `1` when every participant is eligible.
    pub is_all: u8,
    /// Listing position.
    pub sort: i32,
    /// Pool size.
    pub total: u32,
    /// Prize level, always [`DEFAULT_LEVEL`].
    pub level: u8,
    /// Comma separated bucket draw counts.
    #[validate(length(min = 1))]
    pub each_lottery_limit: String,
}

impl PrizeWritePayload {
    /// Update payload mirroring the local state of `prize`.
    pub fn update(prize: &PrizeConfig, scope_id: i64) -> Self {
        Self {
            id: Some(prize.id),
            activity_lottery_id: scope_id,
            name: prize.name.clone(),
            image: prize.image.clone(),
            description: prize.description.clone(),
            is_all: u8::from(prize.eligible_for_all),
            sort: prize.sort_order,
            total: prize.total_count,
            level: DEFAULT_LEVEL,
            each_lottery_limit: format_limit_buckets(&prize.allocation.buckets),
        }
    }

    /// Placeholder prize created by the "add prize" action.
    pub fn placeholder(scope_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: None,
            activity_lottery_id: scope_id,
            name: name.into(),
            image: String::new(),
            description: String::new(),
            is_all: 0,
            sort: 0,
            total: 1,
            level: DEFAULT_LEVEL,
            each_lottery_limit: DEFAULT_LIMIT.to_string(),
        }
    }
}

/// Body of `prize/set-end/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SetEndPayload {
    /// `0` marks the prize drawn out.
    pub is_end: u8,
}

impl SetEndPayload {
    /// The service marks a prize drawn out with `is_end = 0`, matching [`EndFlag::Ended`].
    pub fn ended() -> Self {
        Self { is_end: 0 }
    }
}

/// Body of `prize/set-all/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SetAllPayload {
    /// `1` opens the prize to every participant.
    pub is_all: u8,
}
