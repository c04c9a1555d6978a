//! Populates the local caches from the remote service once a session exists.
//!
//! The person, winner and prize lists are fetched concurrently. Nothing is
//! written to the caches until all three have been fetched and adapted; the
//! swap then happens under both write locks so readers observe either the
//! old collections or the new ones.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    dao::activity_api::ActivityApi,
    dto::{
        envelope::Reply,
        person::{PersonFilter, PersonListQuery, PersonRecordWire, winner_entries},
        prize::{PrizeRecordWire, prize_entries},
    },
    error::{ConsoleError, HydrationError, Resource},
    state::{SharedState, person::PersonRecord, prize::PrizeConfig},
};

/// Sizes of the collections installed by a successful hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrationSummary {
    /// People in the roster.
    pub persons: usize,
    /// Entries in the winner list.
    pub winners: usize,
    /// Prize pools.
    pub prizes: usize,
}

/// Fetch and adapt every collection for `scope_id`, then replace both caches.
///
/// On failure the caches keep their previous contents.
pub async fn hydrate(state: &SharedState, scope_id: i64) -> Result<HydrationSummary, ConsoleError> {
    let api = state.api();
    debug!(scope_id, "hydrating console caches");

    let (persons, winners, prizes) = futures::try_join!(
        fetch_persons(api.as_ref(), scope_id, PersonFilter::default()),
        fetch_winner_count(api.as_ref()),
        fetch_prizes(api.as_ref(), scope_id),
    )
    .inspect_err(|err| {
        warn!(scope_id, resource = %err.resource(), error = %err, "hydration aborted");
    })?;

    let summary = HydrationSummary {
        persons: persons.len(),
        winners,
        prizes: prizes.len(),
    };

    // Lock order: persons, then prizes.
    let mut roster = state.persons_mut().await;
    let mut board = state.prizes_mut().await;
    roster.replace_all(persons);
    board.replace_all(prizes);
    drop(board);
    drop(roster);

    info!(
        scope_id,
        persons = summary.persons,
        winners = summary.winners,
        prizes = summary.prizes,
        "console caches hydrated"
    );
    Ok(summary)
}

/// Unwrap a list response into its payload, tagging failures with `resource`.
fn list_payload(resource: Resource, body: Value) -> Result<Value, HydrationError> {
    Reply::classify(body)
        .into_data()
        .map_err(|source| HydrationError::Rejected { resource, source })
}

/// Fetch the roster matching `filter` and adapt every record.
pub(crate) async fn fetch_persons(
    api: &dyn ActivityApi,
    scope_id: i64,
    filter: PersonFilter,
) -> Result<Vec<PersonRecord>, HydrationError> {
    let body = api
        .list_persons(PersonListQuery::new(scope_id, filter))
        .await
        .map_err(|source| HydrationError::Fetch {
            resource: Resource::Persons,
            source,
        })?;
    adapt_persons(list_payload(Resource::Persons, body)?)
}

/// Fetch the winner list; only its size is kept.
pub(crate) async fn fetch_winner_count(api: &dyn ActivityApi) -> Result<usize, HydrationError> {
    let body = api
        .list_winners()
        .await
        .map_err(|source| HydrationError::Fetch {
            resource: Resource::Winners,
            source,
        })?;
    let data = list_payload(Resource::Winners, body)?;
    if data.is_null() {
        return Ok(0);
    }
    winner_entries(&data)
        .map(Vec::len)
        .ok_or_else(|| HydrationError::Malformed {
            resource: Resource::Winners,
            detail: "expected a list of winners".into(),
        })
}

/// Fetch the prize list for `scope_id` and adapt every record.
pub(crate) async fn fetch_prizes(
    api: &dyn ActivityApi,
    scope_id: i64,
) -> Result<Vec<PrizeConfig>, HydrationError> {
    let body = api
        .list_prizes(scope_id)
        .await
        .map_err(|source| HydrationError::Fetch {
            resource: Resource::Prizes,
            source,
        })?;
    adapt_prizes(&list_payload(Resource::Prizes, body)?)
}

/// Adapt a person list payload: a bare array, `{list: [...]}`, or null for none.
pub fn adapt_persons(data: Value) -> Result<Vec<PersonRecord>, HydrationError> {
    let entries = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("list") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(HydrationError::Malformed {
                    resource: Resource::Persons,
                    detail: "expected a list of persons".into(),
                });
            }
        },
        other => {
            return Err(HydrationError::Malformed {
                resource: Resource::Persons,
                detail: format!("expected a list of persons, got `{other}`"),
            });
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<PersonRecordWire>(entry)
                .map(PersonRecord::from)
                .map_err(|err| HydrationError::Malformed {
                    resource: Resource::Persons,
                    detail: err.to_string(),
                })
        })
        .collect()
}

/// Adapt a prize list payload into [`PrizeConfig`]s, preserving remote order.
pub fn adapt_prizes(data: &Value) -> Result<Vec<PrizeConfig>, HydrationError> {
    prize_entries(data)
        .into_iter()
        .map(|entry| -> Result<PrizeConfig, HydrationError> {
            let wire = serde_json::from_value::<PrizeRecordWire>(entry).map_err(|err| {
                HydrationError::Malformed {
                    resource: Resource::Prizes,
                    detail: err.to_string(),
                }
            })?;
            Ok(PrizeConfig::try_from(wire)?)
        })
        .collect()
}
