use crate::domain::{CacheEntry, ExpiryPolicy};
use crate::ports::EntryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt::Debug;
use tokio::time::Instant;

/// Sharded in-memory entry store.
///
/// Each shard has its own lock, so a write for one id never blocks reads of
/// ids in other shards, and no lock is held across a backend call.
pub struct DashMapEntryStore<R> {
    entries: DashMap<String, CacheEntry<R>>,
}

impl<R> DashMapEntryStore<R> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<R> Default for DashMapEntryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> EntryStore<R> for DashMapEntryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn get(&self, id: &str) -> Option<CacheEntry<R>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    async fn put(&self, id: String, entry: CacheEntry<R>) {
        self.entries.insert(id, entry);
    }

    async fn purge_expired(&self, policy: &ExpiryPolicy) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| policy.is_live(entry, now));
        before.saturating_sub(self.entries.len())
    }

    async fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl<R> Debug for DashMapEntryStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashMapEntryStore")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}
