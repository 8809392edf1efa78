use crate::domain::ExpiryPolicy;
use crate::ports::EntryStore;
use shared::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background sweeper that periodically drops expired entries from a store.
///
/// Expiry is always re-checked on read, so the janitor only bounds memory.
/// The task is aborted when the handle is stopped or dropped.
pub struct Janitor {
    handle: JoinHandle<()>,
}

impl Janitor {
    pub(crate) fn spawn<R>(
        cache_name: String,
        store: Arc<dyn EntryStore<R>>,
        policy: ExpiryPolicy,
        interval: Duration,
    ) -> Result<Self>
    where
        R: Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(Error::Config(
                "janitor interval must be greater than zero".to_string(),
            ));
        }
        let runtime = Handle::try_current().map_err(|_| {
            Error::Config("janitor requires a running tokio runtime".to_string())
        })?;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = store.purge_expired(&policy).await;
                if purged > 0 {
                    tracing::debug!(cache = %cache_name, purged, "Janitor purged expired entries");
                }
            }
        });

        Ok(Self { handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for Janitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Janitor")
            .field("running", &self.is_running())
            .finish()
    }
}
