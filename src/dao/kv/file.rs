use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::dao::storage::{KeyValueStore, StorageError, StorageResult};

type Entries = BTreeMap<String, String>;

/// Store persisting every entry into a single JSON object on disk.
///
/// Each operation re-reads the file so several console processes pointed at
/// the same path observe each other's writes. Writes go through a sibling
/// temporary file followed by a rename.
#[derive(Clone)]
pub struct FileKvStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    gate: Mutex<()>,
}

impl FileKvStore {
    /// Open (lazily) a store at `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                gate: Mutex::new(()),
            }),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.inner.path
    }

    fn update<F>(&self, mutate: F) -> BoxFuture<'static, StorageResult<()>>
    where
        F: FnOnce(&mut Entries) + Send + 'static,
    {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _gate = inner.gate.lock().await;
            let mut entries = inner.load().await?;
            mutate(&mut entries);
            inner.persist(&entries).await
        })
    }
}

impl Inner {
    async fn load(&self) -> StorageResult<Entries> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|err| StorageError::Corrupt {
                    key: self.path.display().to_string(),
                    detail: err.to_string(),
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(StorageError::unavailable(
                format!("failed to read {}", self.path.display()),
                err,
            )),
        }
    }

    async fn persist(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| {
                StorageError::unavailable(format!("failed to create {}", parent.display()), err)
            })?;
        }

        let body = serde_json::to_string_pretty(entries).map_err(|err| {
            StorageError::unavailable("failed to encode session entries".into(), err)
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).await.map_err(|err| {
            StorageError::unavailable(format!("failed to write {}", tmp.display()), err)
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|err| {
            StorageError::unavailable(format!("failed to replace {}", self.path.display()), err)
        })?;

        debug!(path = %self.path.display(), entries = entries.len(), "session file written");
        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let inner = self.inner.clone();
        let key = key.to_string();
        Box::pin(async move {
            let _gate = inner.gate.lock().await;
            let mut entries = inner.load().await?;
            Ok(entries.remove(&key))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_string();
        self.update(move |entries| {
            entries.insert(key, value);
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let key = key.to_string();
        self.update(move |entries| {
            entries.remove(&key);
        })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.update(Entries::clear)
    }
}
