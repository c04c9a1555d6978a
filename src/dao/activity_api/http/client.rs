use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{
    Client, Method, RequestBuilder,
    multipart::{Form, Part},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    dao::{
        activity_api::{
            ActivityApi, Upload,
            error::{ActivityApiError, ApiResult},
        },
        session_store::SessionStore,
    },
    dto::{
        person::{
            CancelDrawPayload, DeletePersonsPayload, PersonListQuery, RemoveWinnerPayload,
            ScopePayload,
        },
        prize::{PrizeWritePayload, SetAllPayload, SetEndPayload},
    },
};

use super::config::HttpApiConfig;

const TOKEN_PATH: &str = "front/activity/lottery/getToken";
const PRIZE_LIST_PATH: &str = "front/activity/lottery/prize/list";
const PRIZE_CREATE_PATH: &str = "front/activity/lottery/prize/create";
const PRIZE_UPDATE_PREFIX: &str = "front/activity/lottery/prize/update";
const PRIZE_SET_END_PREFIX: &str = "front/activity/lottery/prize/set-end";
const PRIZE_SET_ALL_PREFIX: &str = "front/activity/lottery/prize/set-all";
const PRIZE_DELETE_PREFIX: &str = "front/activity/lottery/prize/delete";
const USER_LIST_PATH: &str = "front/activity/lottery/user/list";
const USER_WINNERS_PATH: &str = "front/activity/lottery/user/winners";
const USER_IMPORT_PATH: &str = "front/activity/lottery/user/import";
const USER_EXPORT_PATH: &str = "front/activity/lottery/user/export";
const USER_DELETE_PATH: &str = "front/activity/lottery/user/delete";
const USER_RESET_PATH: &str = "front/activity/lottery/user/reset";
const USER_REMOVE_WINNER_PATH: &str = "front/activity/lottery/user/remove-winner";
const USER_EXPORT_WINNERS_PATH: &str = "front/activity/lottery/user/export-winners";
const USER_TEMPLATE_PATH: &str = "front/activity/lottery/user/download-template";
const CANCEL_DRAW_PATH: &str = "front/activity/lottery/cancel-draw";
const NO_QUERY: [(&str, &str); 0] = [];

/// [`ActivityApi`] over HTTP. The stored session token, when present, is
/// attached to every request as a bearer credential.
#[derive(Clone)]
pub struct HttpActivityApi {
    client: Client,
    base_url: Arc<str>,
    session: SessionStore,
}

impl HttpActivityApi {
    /// Build a client for `config`; the bearer token is read from `session` on every request.
    pub fn new(config: HttpApiConfig, session: SessionStore) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ActivityApiError::ClientBuilder {
                source: Box::new(source),
            })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            session,
        })
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.session.token().await {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(err) => {
                warn!(error = %err, path, "could not read session token; sending without it");
                builder
            }
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> ApiResult<Vec<u8>> {
        let response = builder
            .send()
            .await
            .map_err(|source| ActivityApiError::send(path, source))?;

        let status = response.status();
        if !status.is_success() {
            // The service usually explains rejections in a JSON `message`.
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned));
            return Err(ActivityApiError::RequestStatus {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ActivityApiError::send(path, source))?;
        debug!(path, status = status.as_u16(), len = bytes.len(), "activity API response");
        Ok(bytes.to_vec())
    }

    async fn send_json(&self, builder: RequestBuilder, path: &str) -> ApiResult<Value> {
        let bytes = self.send(builder, path).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| ActivityApiError::decode(path, source))
    }

    fn get_json<Q>(&self, path: String, query: Q) -> BoxFuture<'static, ApiResult<Value>>
    where
        Q: Serialize + Send + 'static,
    {
        let api = self.clone();
        Box::pin(async move {
            let builder = api.request(Method::GET, &path).await.query(&query);
            api.send_json(builder, &path).await
        })
    }

    fn write_json<B>(
        &self,
        method: Method,
        path: String,
        body: Option<B>,
    ) -> BoxFuture<'static, ApiResult<Value>>
    where
        B: Serialize + Send + 'static,
    {
        let api = self.clone();
        Box::pin(async move {
            let mut builder = api.request(method, &path).await;
            if let Some(body) = body {
                builder = builder.json(&body);
            }
            api.send_json(builder, &path).await
        })
    }

    fn download<Q>(&self, path: &'static str, query: Q) -> BoxFuture<'static, ApiResult<Vec<u8>>>
    where
        Q: Serialize + Send + 'static,
    {
        let api = self.clone();
        Box::pin(async move {
            let builder = api.request(Method::GET, path).await.query(&query);
            api.send(builder, path).await
        })
    }
}

impl ActivityApi for HttpActivityApi {
    fn exchange_token(&self, access_key: &str) -> BoxFuture<'static, ApiResult<Value>> {
        self.get_json(TOKEN_PATH.into(), [("accessKey", access_key.to_string())])
    }

    fn list_persons(&self, query: PersonListQuery) -> BoxFuture<'static, ApiResult<Value>> {
        self.get_json(USER_LIST_PATH.into(), query)
    }

    fn list_winners(&self) -> BoxFuture<'static, ApiResult<Value>> {
        self.get_json(USER_WINNERS_PATH.into(), NO_QUERY)
    }

    fn list_prizes(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.get_json(PRIZE_LIST_PATH.into(), ScopePayload {
            activity_lottery_id: scope_id,
        })
    }

    fn create_prize(&self, payload: PrizeWritePayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(Method::POST, PRIZE_CREATE_PATH.into(), Some(payload))
    }

    fn update_prize(
        &self,
        id: i64,
        payload: PrizeWritePayload,
    ) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(
            Method::POST,
            format!("{PRIZE_UPDATE_PREFIX}/{id}"),
            Some(payload),
        )
    }

    fn mark_prize_ended(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(
            Method::POST,
            format!("{PRIZE_SET_END_PREFIX}/{id}"),
            Some(SetEndPayload::ended()),
        )
    }

    fn set_prize_for_all(&self, id: i64, for_all: bool) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(
            Method::POST,
            format!("{PRIZE_SET_ALL_PREFIX}/{id}"),
            Some(SetAllPayload {
                is_all: u8::from(for_all),
            }),
        )
    }

    fn delete_prize(&self, id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json::<()>(Method::DELETE, format!("{PRIZE_DELETE_PREFIX}/{id}"), None)
    }

    fn import_persons(&self, scope_id: i64, file: Upload) -> BoxFuture<'static, ApiResult<Value>> {
        let api = self.clone();
        Box::pin(async move {
            let part = Part::bytes(file.bytes).file_name(file.file_name);
            let form = Form::new()
                .part("file", part)
                .text("activity_lottery_id", scope_id.to_string());
            let builder = api
                .request(Method::POST, USER_IMPORT_PATH)
                .await
                .multipart(form);
            api.send_json(builder, USER_IMPORT_PATH).await
        })
    }

    fn export_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.download(USER_EXPORT_PATH, ScopePayload {
            activity_lottery_id: scope_id,
        })
    }

    fn delete_persons(
        &self,
        payload: DeletePersonsPayload,
    ) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(Method::DELETE, USER_DELETE_PATH.into(), Some(payload))
    }

    fn reset_persons(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(
            Method::POST,
            USER_RESET_PATH.into(),
            Some(ScopePayload {
                activity_lottery_id: scope_id,
            }),
        )
    }

    fn remove_winner(&self, payload: RemoveWinnerPayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(Method::POST, USER_REMOVE_WINNER_PATH.into(), Some(payload))
    }

    fn export_winners(&self, scope_id: i64) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.download(USER_EXPORT_WINNERS_PATH, ScopePayload {
            activity_lottery_id: scope_id,
        })
    }

    fn cancel_draw(&self, payload: CancelDrawPayload) -> BoxFuture<'static, ApiResult<Value>> {
        self.write_json(Method::POST, CANCEL_DRAW_PATH.into(), Some(payload))
    }

    fn download_template(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        self.download(USER_TEMPLATE_PATH, NO_QUERY)
    }
}
