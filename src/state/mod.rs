pub mod lifecycle;
mod sse;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::store::PlaykersStore, error::ServiceError};

pub use self::sse::{MatchHubs, SseHub};

pub type SharedState = Arc<AppState>;

/// Central application state: the installed store, degraded flag and live match hubs.
pub struct AppState {
    store: RwLock<Option<Arc<dyn PlaykersStore>>>,
    degraded: watch::Sender<bool>,
    match_hubs: MatchHubs,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            match_hubs: MatchHubs::new(config.sse_capacity()),
            config,
        })
    }

    /// Construct a state with `store` already installed (memory store, tests).
    pub fn with_store(config: AppConfig, store: Arc<dyn PlaykersStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            store: RwLock::new(Some(store)),
            degraded: degraded_tx,
            match_hubs: MatchHubs::new(config.sse_capacity()),
            config,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn PlaykersStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Return the store or a degraded-mode error.
    pub async fn require_store(&self) -> Result<Arc<dyn PlaykersStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn PlaykersStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hubs keyed by match id.
    pub fn match_hubs(&self) -> &MatchHubs {
        &self.match_hubs
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
