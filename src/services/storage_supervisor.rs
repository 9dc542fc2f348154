use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, store::PlaykersStore},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Doubling delay capped at [`MAX_DELAY`].
struct Backoff {
    current: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current: INITIAL_DELAY,
        }
    }

    async fn wait(&mut self) {
        sleep(self.current).await;
        self.current = (self.current * 2).min(MAX_DELAY);
    }

    fn reset(&mut self) {
        self.current = INITIAL_DELAY;
    }
}

/// Connect to the document store, watch its health and keep the shared state in
/// degraded mode while it is unreachable.
///
/// Runs for the lifetime of the process; `connect` is invoked again whenever in-place
/// reconnection gives up.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn PlaykersStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                backoff.reset();

                watch_health(&state, store.as_ref()).await;

                warn!("exhausted storage reconnect attempts; dropping the store and reconnecting from scratch");
                state.clear_store().await;
                backoff.wait().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                backoff.wait().await;
            }
        }
    }
}

/// Poll `store` until in-place reconnection fails [`MAX_RECONNECT_ATTEMPTS`] times in a row.
async fn watch_health(state: &SharedState, store: &dyn PlaykersStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store).await {
                    return;
                }
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn PlaykersStore) -> bool {
    let mut backoff = Backoff::new();

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) if attempt == 0 => {
                warn!(attempt, error = %err, "storage reconnect first attempt failed; entering degraded mode");
                state.update_degraded(true);
            }
            Err(err) => warn!(attempt, error = %err, "storage reconnect attempt failed"),
        }
        backoff.wait().await;
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{config::AppConfig, dao::store::memory::MemoryStore, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn leaves_degraded_mode_once_connected() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());

        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let supervisor = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable("connection refused".into(), std::io::Error::other("down")))
                } else {
                    Ok(Arc::new(MemoryStore::new()) as Arc<dyn PlaykersStore>)
                }
            }
        }));

        let mut degraded = state.degraded_watcher();
        tokio::time::timeout(Duration::from_secs(60), degraded.wait_for(|value| !value))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(state.require_store().await.is_ok());
        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_capped() {
        let mut backoff = Backoff::new();
        for _ in 0..6 {
            backoff.wait().await;
        }
        assert_eq!(backoff.current, MAX_DELAY);
        backoff.reset();
        assert_eq!(backoff.current, INITIAL_DELAY);
    }
}
