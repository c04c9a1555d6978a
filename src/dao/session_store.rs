//! Typed access to the three durable session scalars.

use std::sync::Arc;

use crate::dao::storage::{KeyValueStore, StorageError, StorageResult};

const TOKEN_KEY: &str = "userToken";
const SCOPE_ID_KEY: &str = "activityLotteryId";
const ACCESS_KEY_KEY: &str = "accessKey";

/// Credentials tying the console to one activity instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Access key the session was bootstrapped from, if still stored.
    pub access_key: Option<String>,
    /// Bearer token sent on every remote call.
    pub token: String,
    /// Activity lottery instance every call is filtered by.
    pub scope_id: i64,
}

/// Wrapper around a [`KeyValueStore`] exposing the session fields by name.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Wrap a key-value backend.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Stored bearer token.
    pub async fn token(&self) -> StorageResult<Option<String>> {
        self.backend.get(TOKEN_KEY).await
    }

    /// Persist the bearer token.
    pub async fn set_token(&self, token: &str) -> StorageResult<()> {
        self.backend.set(TOKEN_KEY, token.to_string()).await
    }

    /// Stored scope id; a value that is not an integer is treated as corrupt.
    pub async fn scope_id(&self) -> StorageResult<Option<i64>> {
        match self.backend.get(SCOPE_ID_KEY).await? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|err| StorageError::Corrupt {
                    key: SCOPE_ID_KEY.into(),
                    detail: err.to_string(),
                }),
        }
    }

    /// Persist the activity scope id.
    pub async fn set_scope_id(&self, scope_id: i64) -> StorageResult<()> {
        self.backend.set(SCOPE_ID_KEY, scope_id.to_string()).await
    }

    /// Stored access key.
    pub async fn access_key(&self) -> StorageResult<Option<String>> {
        self.backend.get(ACCESS_KEY_KEY).await
    }

    /// Persist the access key.
    pub async fn set_access_key(&self, access_key: &str) -> StorageResult<()> {
        self.backend
            .set(ACCESS_KEY_KEY, access_key.to_string())
            .await
    }

    /// Remove token, scope id and access key. Other keys in the backend are untouched.
    pub async fn clear(&self) -> StorageResult<()> {
        self.backend.remove(TOKEN_KEY).await?;
        self.backend.remove(SCOPE_ID_KEY).await?;
        self.backend.remove(ACCESS_KEY_KEY).await
    }

    /// The stored session, present only when both token and scope id are set.
    pub async fn session(&self) -> StorageResult<Option<Session>> {
        let (Some(token), Some(scope_id)) = (self.token().await?, self.scope_id().await?) else {
            return Ok(None);
        };
        Ok(Some(Session {
            access_key: self.access_key().await?,
            token,
            scope_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::kv::MemoryKvStore;

    fn store() -> (SessionStore, MemoryKvStore) {
        let backend = MemoryKvStore::new();
        (SessionStore::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn session_requires_token_and_scope() {
        let (session, _) = store();
        session.set_token("t-1").await.unwrap();
        assert_eq!(session.session().await.unwrap(), None);

        session.set_scope_id(7).await.unwrap();
        let established = session.session().await.unwrap().unwrap();
        assert_eq!(established.token, "t-1");
        assert_eq!(established.scope_id, 7);
        assert_eq!(established.access_key, None);
    }

    #[tokio::test]
    async fn clear_only_drops_session_keys() {
        let (session, backend) = store();
        backend.set("theme", "dark".into()).await.unwrap();
        session.set_access_key("k").await.unwrap();
        session.set_token("t").await.unwrap();
        session.set_scope_id(1).await.unwrap();

        session.clear().await.unwrap();

        assert_eq!(session.access_key().await.unwrap(), None);
        assert_eq!(session.token().await.unwrap(), None);
        assert_eq!(session.scope_id().await.unwrap(), None);
        assert_eq!(backend.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn non_numeric_scope_is_corrupt() {
        let (session, backend) = store();
        backend.set(SCOPE_ID_KEY, "abc".into()).await.unwrap();
        assert!(matches!(
            session.scope_id().await,
            Err(StorageError::Corrupt { .. })
        ));
    }
}
