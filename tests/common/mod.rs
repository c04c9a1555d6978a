//! In-memory stand-in for the remote activity service.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use futures::{FutureExt, future::BoxFuture};
use serde_json::{Value, json};

use lottery_console::{
    config::AppConfig,
    dao::{
        activity_api::{ActivityApi, ActivityApiError, ApiResult, Upload},
        kv::MemoryKvStore,
        session_store::SessionStore,
    },
    dto::{
        person::{CancelDrawPayload, DeletePersonsPayload, PersonListQuery, RemoveWinnerPayload},
        prize::PrizeWritePayload,
    },
    state::{ConsoleState, SharedState},
};

/// Remote call as observed by the fake, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ExchangeToken(String),
    ListPersons(i64),
    ListWinners,
    ListPrizes(i64),
    CreatePrize(String),
    UpdatePrize { id: i64, limit: String },
    MarkPrizeEnded(i64),
    SetPrizeForAll(i64, bool),
    DeletePrize(i64),
    ImportPersons(i64, String),
    ExportPersons(i64),
    DeletePersons(Vec<String>),
    ResetPersons(i64),
    RemoveWinner(String),
    ExportWinners(i64),
    CancelDraw(i64, Vec<String>),
    DownloadTemplate,
}

#[derive(Default)]
struct Remote {
    calls: Vec<Call>,
    token_reply: Option<Value>,
    tokens_seen_at_exchange: Vec<Option<String>>,
    persons: Vec<Value>,
    winners: Vec<Value>,
    prizes: Vec<Value>,
    reject_prize_list: bool,
    failing_updates: HashSet<i64>,
    failing_deletes: HashSet<i64>,
    next_prize_id: i64,
}

/// Scriptable [`ActivityApi`] keeping its own person and prize tables.
#[derive(Clone)]
pub struct FakeActivityApi {
    remote: Arc<Mutex<Remote>>,
    session: SessionStore,
}

pub fn ok(data: Value) -> Value {
    json!({"code": 200, "message": "ok", "data": data})
}

pub fn rejected(message: &str) -> Value {
    json!({"code": 500, "message": message})
}

pub fn prize(id: i64, name: &str, total: i64, remaining: i64, limit: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "sort": id,
        "is_all": 0,
        "total": total,
        "remaining": remaining,
        "image": "",
        "description": "",
        "is_end": "1",
        "each_lottery_limit": limit,
    })
}

pub fn person(code: &str, winner: bool) -> Value {
    json!({
        "lottery_code": code,
        "name": format!("person {code}"),
        "is_sign": 1,
        "is_winner": if winner { 1 } else { 0 },
    })
}

impl FakeActivityApi {
    /// `session` must share the backend the console uses, so the fake can
    /// observe what was stored at the moment a call arrived.
    pub fn new(session: SessionStore) -> Self {
        Self {
            remote: Arc::new(Mutex::new(Remote {
                next_prize_id: 100,
                ..Remote::default()
            })),
            session,
        }
    }

    fn remote(&self) -> std::sync::MutexGuard<'_, Remote> {
        self.remote.lock().unwrap()
    }

    /// Grant `token` / `scope_id` through the enveloped token shape.
    pub fn grant(&self, token: &str, scope_id: i64) {
        self.remote().token_reply = Some(ok(json!({
            "token": token,
            "activity_lottery_id": scope_id,
        })));
    }

    /// Answer the token exchange with an arbitrary body.
    pub fn token_reply(&self, body: Value) {
        self.remote().token_reply = Some(body);
    }

    /// Refuse the token exchange with HTTP 401.
    pub fn refuse_token(&self) {
        self.remote().token_reply = None;
    }

    pub fn set_persons(&self, persons: Vec<Value>) {
        self.remote().persons = persons;
    }

    pub fn set_winners(&self, winners: Vec<Value>) {
        self.remote().winners = winners;
    }

    pub fn set_prizes(&self, prizes: Vec<Value>) {
        self.remote().prizes = prizes;
    }

    pub fn reject_prize_list(&self, reject: bool) {
        self.remote().reject_prize_list = reject;
    }

    pub fn fail_update(&self, id: i64) {
        self.remote().failing_updates.insert(id);
    }

    pub fn fail_delete(&self, id: i64) {
        self.remote().failing_deletes.insert(id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.remote().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.remote().calls.clear();
    }

    pub fn tokens_seen_at_exchange(&self) -> Vec<Option<String>> {
        self.remote().tokens_seen_at_exchange.clone()
    }

    pub fn remote_prize_names(&self) -> Vec<String> {
        self.remote()
            .prizes
            .iter()
            .filter_map(|prize| prize["name"].as_str().map(str::to_owned))
            .collect()
    }

    fn record(&self, call: Call) {
        self.remote().calls.push(call);
    }
}

fn reply<T: Send + 'static>(result: ApiResult<T>) -> BoxFuture<'static, ApiResult<T>> {
    futures::future::ready(result).boxed()
}

impl ActivityApi for FakeActivityApi {
    fn exchange_token(&self, access_key: &str) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ExchangeToken(access_key.to_string()));
        let remote = self.remote.clone();
        let session = self.session.clone();
        async move {
            let stored = session.token().await.ok().flatten();
            let mut remote = remote.lock().unwrap();
            remote.tokens_seen_at_exchange.push(stored);
            remote
                .token_reply
                .clone()
                .ok_or_else(|| ActivityApiError::RequestStatus {
                    path: "front/activity/lottery/getToken".into(),
                    status: 401,
                    message: Some("access key rejected".into()),
                })
        }
        .boxed()
    }

    fn list_persons(&self, query: PersonListQuery) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ListPersons(query.activity_lottery_id));
        let persons = self.remote().persons.clone();
        let winner = query.is_winner;
        let filtered = persons
            .into_iter()
            .filter(|person| winner.is_none_or(|flag| person["is_winner"] == json!(flag)))
            .collect::<Vec<_>>();
        reply(Ok(ok(Value::Array(filtered))))
    }

    fn list_winners(&self) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ListWinners);
        let winners = self.remote().winners.clone();
        reply(Ok(ok(json!({ "list": winners }))))
    }

    fn list_prizes(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ListPrizes(scope_id));
        let remote = self.remote();
        if remote.reject_prize_list {
            return reply(Ok(rejected("prize list unavailable")));
        }
        reply(Ok(ok(json!({ "prizes": remote.prizes.clone() }))))
    }

    fn create_prize(&self, payload: PrizeWritePayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::CreatePrize(payload.name.clone()));
        let mut remote = self.remote();
        let id = remote.next_prize_id;
        remote.next_prize_id += 1;
        let total = i64::from(payload.total);
        remote.prizes.push(prize(
            id,
            &payload.name,
            total,
            total,
            &payload.each_lottery_limit,
        ));
        reply(Ok(ok(json!({ "id": id }))))
    }

    fn update_prize(
        &self,
        id: i64,
        payload: PrizeWritePayload,
    ) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::UpdatePrize {
            id,
            limit: payload.each_lottery_limit.clone(),
        });
        let mut remote = self.remote();
        if remote.failing_updates.contains(&id) {
            return reply(Ok(rejected("update refused")));
        }
        if let Some(record) = remote.prizes.iter_mut().find(|p| p["id"] == json!(id)) {
            record["name"] = json!(payload.name);
            record["each_lottery_limit"] = json!(payload.each_lottery_limit);
        }
        reply(Ok(ok(Value::Null)))
    }

    fn mark_prize_ended(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::MarkPrizeEnded(id));
        let mut remote = self.remote();
        if let Some(record) = remote.prizes.iter_mut().find(|p| p["id"] == json!(id)) {
            record["is_end"] = json!("0");
        }
        reply(Ok(ok(Value::Null)))
    }

    fn set_prize_for_all(&self, id: i64, for_all: bool) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::SetPrizeForAll(id, for_all));
        let mut remote = self.remote();
        if let Some(record) = remote.prizes.iter_mut().find(|p| p["id"] == json!(id)) {
            record["is_all"] = json!(u8::from(for_all));
        }
        reply(Ok(ok(Value::Null)))
    }

    fn delete_prize(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::DeletePrize(id));
        let mut remote = self.remote();
        if remote.failing_deletes.contains(&id) {
            return reply(Err(ActivityApiError::RequestStatus {
                path: format!("front/activity/lottery/prize/delete/{id}"),
                status: 409,
                message: Some("prize already drawn".into()),
            }));
        }
        remote.prizes.retain(|p| p["id"] != json!(id));
        reply(Ok(ok(Value::Null)))
    }

    fn import_persons(&self, scope_id: i64, file: Upload) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ImportPersons(scope_id, file.file_name.clone()));
        reply(Ok(ok(Value::Null)))
    }

    fn export_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.record(Call::ExportPersons(scope_id));
        reply(Ok(b"roster".to_vec()))
    }

    fn delete_persons(
        &self,
        payload: DeletePersonsPayload,
    ) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::DeletePersons(payload.lottery_codes.clone()));
        let mut remote = self.remote();
        remote.persons.retain(|person| {
            !payload
                .lottery_codes
                .iter()
                .any(|code| person["lottery_code"] == json!(code))
        });
        reply(Ok(ok(Value::Null)))
    }

    fn reset_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::ResetPersons(scope_id));
        let mut remote = self.remote();
        for person in remote.persons.iter_mut() {
            person["is_sign"] = json!(0);
            person["is_winner"] = json!(0);
        }
        reply(Ok(ok(Value::Null)))
    }

    fn remove_winner(&self, payload: RemoveWinnerPayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::RemoveWinner(payload.lottery_code.clone()));
        let mut remote = self.remote();
        if let Some(person) = remote
            .persons
            .iter_mut()
            .find(|p| p["lottery_code"] == json!(payload.lottery_code))
        {
            person["is_winner"] = json!(0);
        }
        reply(Ok(ok(Value::Null)))
    }

    fn export_winners(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.record(Call::ExportWinners(scope_id));
        reply(Ok(b"winners".to_vec()))
    }

    fn cancel_draw(&self, payload: CancelDrawPayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.record(Call::CancelDraw(
            payload.prize_id,
            payload.lottery_codes.clone(),
        ));
        reply(Ok(ok(Value::Null)))
    }

    fn download_template(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.record(Call::DownloadTemplate);
        reply(Ok(b"template".to_vec()))
    }
}

/// Console wired to a fresh in-memory store and a fake remote sharing it.
pub struct Harness {
    pub state: SharedState,
    pub api: FakeActivityApi,
    pub kv: MemoryKvStore,
}

impl Harness {
    pub fn new() -> Self {
        let kv = MemoryKvStore::new();
        let session = SessionStore::new(Arc::new(kv.clone()));
        let api = FakeActivityApi::new(session.clone());
        let state = ConsoleState::new(AppConfig::default(), session, Arc::new(api.clone()));
        Self { state, api, kv }
    }

    /// Harness whose remote grants `token` for scope `scope_id` and serves
    /// the given collections.
    pub fn seeded(token: &str, scope_id: i64, persons: Vec<Value>, prizes: Vec<Value>) -> Self {
        let harness = Self::new();
        harness.api.grant(token, scope_id);
        harness.api.set_persons(persons);
        harness.api.set_prizes(prizes);
        harness
    }
}
