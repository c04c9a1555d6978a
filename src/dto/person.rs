//! Wire shapes for the participant roster endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};
use uuid::Uuid;

use crate::{
    dto::{
        common::{Flag, Text},
        now_timestamp,
    },
    state::person::{PersonRecord, PrizeAward},
};

/// Person entry as returned by `user/list`. Every field is optional on the
/// wire, and text fields tolerate numbers (`phone`, `lottery_code`, ...).
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonRecordWire {
    /// Remote primary key.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub id: Option<i64>,
    /// Fallback participant code.
    pub uid: Option<Text>,
    /// Remote uuid.
    pub uuid: Option<Text>,
    /// Participant code used by draws.
    pub lottery_code: Option<Text>,
    /// Display name.
    pub name: Option<Text>,
    /// Department.
    pub department: Option<Text>,
    /// Identity document or badge number.
    pub identity: Option<Text>,
    /// Avatar URL.
    pub avatar: Option<Text>,
    /// Phone number, often numeric on the wire.
    pub phone: Option<Text>,
    /// Company.
    pub company: Option<Text>,
    /// Job title.
    pub position: Option<Text>,
    /// Checked in.
    pub is_sign: Option<Flag>,
    /// Winner flag.
    pub is_winner: Option<Flag>,
    /// Creation timestamp.
    pub created_at: Option<Text>,
    /// Last update timestamp.
    pub updated_at: Option<Text>,
    /// Awarded prize ids, parallel to `prize_name` and `prize_time`.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<Vec<DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>>>>")]
    pub prize_id: Option<Vec<Option<i64>>>,
    /// Awarded prize names.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub prize_name: Option<Vec<Text>>,
    /// Award timestamps.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub prize_time: Option<Vec<Text>>,
    /// Nested award list; preferred over the parallel arrays.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub prizes: Option<Vec<PrizeAwardWire>>,
}

/// Entry of the nested `prizes` list attached to a person.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrizeAwardWire {
    /// Awarded prize id.
    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    pub prize_id: Option<i64>,
    /// Prize name at award time.
    pub prize_name: Option<Text>,
    /// Award timestamp.
    pub prize_time: Option<Text>,
}

impl From<PrizeAwardWire> for PrizeAward {
    fn from(value: PrizeAwardWire) -> Self {
        Self {
            prize_id: value.prize_id,
            prize_name: text_or_default(value.prize_name),
            prize_time: text_or_default(value.prize_time),
        }
    }
}

fn text_or_default(value: Option<Text>) -> String {
    value.map(String::from).unwrap_or_default()
}

impl PersonRecordWire {
    /// Awards from the nested `prizes` list, or zipped from the parallel
    /// `prize_id` / `prize_name` / `prize_time` arrays when that list is absent.
    fn awards(
        prizes: Option<Vec<PrizeAwardWire>>,
        ids: Option<Vec<Option<i64>>>,
        names: Option<Vec<Text>>,
        times: Option<Vec<Text>>,
    ) -> Vec<PrizeAward> {
        if let Some(prizes) = prizes.filter(|list| !list.is_empty()) {
            return prizes.into_iter().map(PrizeAward::from).collect();
        }

        let ids = ids.unwrap_or_default();
        let names = names.unwrap_or_default();
        let times = times.unwrap_or_default();
        let len = ids.len().max(names.len()).max(times.len());
        (0..len)
            .map(|index| PrizeAward {
                prize_id: ids.get(index).copied().flatten(),
                prize_name: names.get(index).cloned().map(String::from).unwrap_or_default(),
                prize_time: times.get(index).cloned().map(String::from).unwrap_or_default(),
            })
            .collect()
    }
}

impl From<PersonRecordWire> for PersonRecord {
    fn from(wire: PersonRecordWire) -> Self {
        let code = wire
            .lottery_code
            .map(String::from)
            .filter(|code| !code.is_empty())
            .or_else(|| wire.uid.map(String::from).filter(|uid| !uid.is_empty()));
        let code_assigned = code.is_none();
        let code = code.unwrap_or_else(|| Uuid::new_v4().to_string());
        let prizes = PersonRecordWire::awards(
            wire.prizes,
            wire.prize_id,
            wire.prize_name,
            wire.prize_time,
        );

        Self {
            id: wire.id,
            code,
            code_assigned,
            uuid: text_or_default(wire.uuid),
            name: text_or_default(wire.name),
            department: text_or_default(wire.department),
            company: text_or_default(wire.company),
            position: text_or_default(wire.position),
            identity: text_or_default(wire.identity),
            avatar: text_or_default(wire.avatar),
            phone: text_or_default(wire.phone),
            signed_in: wire.is_sign.map(bool::from).unwrap_or(false),
            is_winner: wire.is_winner.map(bool::from).unwrap_or(false),
            prizes,
            created_at: wire
                .created_at
                .map(String::from)
                .unwrap_or_else(now_timestamp),
            updated_at: wire
                .updated_at
                .map(String::from)
                .unwrap_or_else(now_timestamp),
        }
    }
}

/// Winner list payload: either `{list: [...]}` or the bare array.
pub fn winner_entries(data: &Value) -> Option<&Vec<Value>> {
    data.get("list")
        .and_then(Value::as_array)
        .or_else(|| data.as_array())
}

/// Query parameters of `user/list`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonListQuery {
    /// Activity to list.
    pub activity_lottery_id: i64,
    /// `1` for winners only, `0` for non-winners only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_winner: Option<u8>,
    /// `1` for checked-in only, `0` for the rest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sign: Option<u8>,
}

/// Roster filter chosen by the operator; `None` means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonFilter {
    /// Restrict on the winner flag.
    pub winner: Option<bool>,
    /// Restrict on check-in.
    pub signed_in: Option<bool>,
}

impl PersonListQuery {
    /// Query for `scope_id` narrowed by `filter`.
    pub fn new(scope_id: i64, filter: PersonFilter) -> Self {
        Self {
            activity_lottery_id: scope_id,
            is_winner: filter.winner.map(u8::from),
            is_sign: filter.signed_in.map(u8::from),
        }
    }
}

/// Body shared by endpoints that only need the activity scope.
#[derive(Debug, Clone, Serialize)]
pub struct ScopePayload {
    /// Target activity.
    pub activity_lottery_id: i64,
}

/// Body of `user/delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeletePersonsPayload {
    /// Target activity.
    pub activity_lottery_id: i64,
    /// Codes to delete.
    pub lottery_codes: Vec<String>,
}

/// Body of `user/remove-winner`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveWinnerPayload {
    /// Target activity.
    pub activity_lottery_id: i64,
    /// Winner to strip.
    pub lottery_code: String,
}

/// Body of `cancel-draw`.
#[derive(Debug, Clone, Serialize)]
pub struct CancelDrawPayload {
    /// Target activity.
    pub activity_lottery_id: i64,
    /// Prize whose draw is undone.
    pub prize_id: i64,
    /// People whose draw is undone.
    pub lottery_codes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapt(value: Value) -> PersonRecord {
        serde_json::from_value::<PersonRecordWire>(value).unwrap().into()
    }

    #[test]
    fn sparse_record_gets_defaults() {
        let person = adapt(json!({"lottery_code": "1B0632BD"}));
        assert_eq!(person.code, "1B0632BD");
        assert!(!person.code_assigned);
        assert_eq!(person.name, "");
        assert!(!person.signed_in);
        assert!(!person.is_winner);
        assert!(person.prizes.is_empty());
        assert!(!person.created_at.is_empty());
        assert!(!person.updated_at.is_empty());
    }

    #[test]
    fn code_falls_back_to_uid_then_generated() {
        assert_eq!(adapt(json!({"uid": "u-7"})).code, "u-7");

        let generated = adapt(json!({"name": "Ada", "lottery_code": null}));
        assert!(generated.code_assigned);
        assert!(Uuid::parse_str(&generated.code).is_ok());
    }

    #[test]
    fn winner_flag_and_prizes_are_kept_independently() {
        let person = adapt(json!({
            "lottery_code": "A1",
            "is_winner": 0,
            "prizes": [{"prize_id": 4, "prize_name": "Air conditioner", "prize_time": "2026-01-01 10:00:00"}]
        }));
        assert!(!person.is_winner);
        assert_eq!(person.prizes.len(), 1);
        assert_eq!(person.prizes[0].prize_id, Some(4));

        let person = adapt(json!({"lottery_code": "A2", "is_winner": "1", "is_sign": 1}));
        assert!(person.is_winner);
        assert!(person.signed_in);
        assert!(person.prizes.is_empty());
    }

    #[test]
    fn parallel_award_arrays_are_zipped_in_order() {
        let person = adapt(json!({
            "lottery_code": "A3",
            "prize_id": ["2", 5],
            "prize_name": ["Mug", "Bike"],
            "prize_time": ["t1"]
        }));
        let names: Vec<_> = person.prizes.iter().map(|p| p.prize_name.as_str()).collect();
        assert_eq!(names, ["Mug", "Bike"]);
        assert_eq!(person.prizes[1].prize_id, Some(5));
        assert_eq!(person.prizes[1].prize_time, "");
    }

    #[test]
    fn numeric_text_fields_are_read_as_text() {
        let person = adapt(json!({"lottery_code": 1001, "phone": 13800000000i64, "name": "Ada"}));
        assert_eq!(person.code, "1001");
        assert!(!person.code_assigned);
        assert_eq!(person.phone, "13800000000");
        assert_eq!(person.name, "Ada");
    }

    #[test]
    fn null_award_entries_read_as_blanks() {
        let person = adapt(json!({
            "lottery_code": "A4",
            "prize_id": [3, null, "x"],
            "prize_name": ["Mug", null, "Pen"],
            "prize_time": null
        }));
        let awards: Vec<_> = person
            .prizes
            .iter()
            .map(|award| (award.prize_id, award.prize_name.as_str()))
            .collect();
        assert_eq!(awards, [(Some(3), "Mug"), (None, ""), (None, "Pen")]);

        let person = adapt(json!({"lottery_code": "A5", "prize_name": "Mug", "id": "n/a"}));
        assert!(person.prizes.is_empty());
        assert_eq!(person.id, None);
    }

    #[test]
    fn list_query_skips_unset_filters() {
        let query = PersonListQuery::new(3, PersonFilter {
            winner: Some(true),
            signed_in: None,
        });
        assert_eq!(
            serde_json::to_value(query).unwrap(),
            json!({"activity_lottery_id": 3, "is_winner": 1})
        );
    }
}
