/// Operator notices and their broadcast hub.
pub mod notice;
/// Participant roster cache.
pub mod person;
/// Prize board and allocation model.
pub mod prize;

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, watch};

use crate::{
    config::AppConfig,
    dao::{activity_api::ActivityApi, session_store::SessionStore},
    error::ConsoleError,
};

pub use self::notice::{Notice, NoticeHub, NoticeLevel};
use self::{person::PersonRoster, prize::PrizeBoard};

/// Shared handle to the console state.
pub type SharedState = Arc<ConsoleState>;

/// Where the console is in its startup sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    /// No bootstrap has run yet.
    Idle,
    /// Token exchange or hydration in flight.
    Loading,
    /// Session established and caches hydrated.
    Ready {
        /// Activity the session is scoped to.
        scope_id: i64,
    },
    /// Bootstrap failed; the message is meant for display before redirecting.
    Failed {
        /// Reason shown to the operator.
        message: String,
    },
}

/// Central console state: durable session handle, remote service handle and
/// the cached person and prize collections for the current scope.
///
/// There is no global instance; every consumer is handed a [`SharedState`].
pub struct ConsoleState {
    config: AppConfig,
    session: SessionStore,
    api: Arc<dyn ActivityApi>,
    persons: RwLock<PersonRoster>,
    prizes: RwLock<PrizeBoard>,
    notices: NoticeHub,
    status: watch::Sender<BootstrapStatus>,
}

impl ConsoleState {
    /// Construct a new [`ConsoleState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, session: SessionStore, api: Arc<dyn ActivityApi>) -> SharedState {
        let (status, _rx) = watch::channel(BootstrapStatus::Idle);
        Arc::new(Self {
            notices: NoticeHub::new(config.notice_capacity),
            config,
            session,
            api,
            persons: RwLock::new(PersonRoster::new()),
            prizes: RwLock::new(PrizeBoard::new()),
            status,
        })
    }

    /// Configuration the console was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Durable session fields.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Remote activity service.
    pub fn api(&self) -> Arc<dyn ActivityApi> {
        self.api.clone()
    }

    /// Read access to the roster cache.
    pub async fn persons(&self) -> RwLockReadGuard<'_, PersonRoster> {
        self.persons.read().await
    }

    /// Write access to the roster cache.
    pub async fn persons_mut(&self) -> RwLockWriteGuard<'_, PersonRoster> {
        self.persons.write().await
    }

    /// Read access to the prize board.
    pub async fn prizes(&self) -> RwLockReadGuard<'_, PrizeBoard> {
        self.prizes.read().await
    }

    /// Write access to the prize board.
    pub async fn prizes_mut(&self) -> RwLockWriteGuard<'_, PrizeBoard> {
        self.prizes.write().await
    }

    /// Drop both cached collections.
    pub async fn reset_caches(&self) {
        self.persons.write().await.reset();
        self.prizes.write().await.reset();
    }

    /// Established scope id, or [`ConsoleError::MissingScope`].
    pub async fn require_scope(&self) -> Result<i64, ConsoleError> {
        self.session
            .scope_id()
            .await?
            .ok_or(ConsoleError::MissingScope)
    }

    /// Hub views subscribe to for operator notices.
    pub fn notices(&self) -> &NoticeHub {
        &self.notices
    }

    /// Publish a notice to every subscribed view.
    pub fn notify(&self, notice: Notice) {
        self.notices.publish(notice);
    }

    /// Current bootstrap status.
    pub fn status(&self) -> BootstrapStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to bootstrap status updates.
    pub fn status_watcher(&self) -> watch::Receiver<BootstrapStatus> {
        self.status.subscribe()
    }

    pub(crate) fn set_status(&self, status: BootstrapStatus) {
        self.status.send_replace(status);
    }
}
