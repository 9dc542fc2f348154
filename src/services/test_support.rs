//! Fixtures shared by the service tests.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::store::memory::MemoryStore,
    identity::CurrentUser,
    state::{AppState, SharedState},
};

pub(crate) const BASE_URL: &str = "https://playkers.test";

/// Fresh state over an empty in-memory store, plus a handle on that store.
pub(crate) fn memory_state() -> (SharedState, MemoryStore) {
    let store = MemoryStore::new();
    let config = AppConfig::default().with_public_base_url(BASE_URL);
    let state = AppState::with_store(config, Arc::new(store.clone()));
    (state, store)
}

pub(crate) fn user(id: &str) -> CurrentUser {
    CurrentUser::new(id, Some(format!("User {id}")))
}
