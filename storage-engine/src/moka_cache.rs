use appmeta::domain::{CacheEntry, ExpiryPolicy};
use appmeta::ports::EntryStore;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Gives each entry the TTL of its class, restarting the clock on replace.
struct EntryExpiry {
    policy: ExpiryPolicy,
}

impl<R> Expiry<String, CacheEntry<R>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry<R>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.policy.ttl_for(&value.state))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry<R>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.policy.ttl_for(&value.state))
    }
}

/// Moka-based entry store.
/// Moka evicts entries once their class TTL has passed, so stale entries do
/// not pile up; liveness is still decided by the lookup on every read.
///
/// Moka measures expiry on the wall clock, not the tokio clock, so a paused
/// or advanced tokio clock does not move moka's evictions.
pub struct MokaEntryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    cache: Cache<String, CacheEntry<R>>,
}

impl<R> MokaEntryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn new(name: &str, policy: ExpiryPolicy) -> Self {
        let cache = Cache::builder()
            .name(name)
            .expire_after(EntryExpiry { policy })
            .build();

        Self { cache }
    }
}

#[async_trait]
impl<R> EntryStore<R> for MokaEntryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    async fn get(&self, id: &str) -> Option<CacheEntry<R>> {
        self.cache.get(id).await
    }

    async fn put(&self, id: String, entry: CacheEntry<R>) {
        self.cache.insert(id, entry).await;
    }

    async fn purge_expired(&self, policy: &ExpiryPolicy) -> usize {
        let now = tokio::time::Instant::now();
        let expired: Vec<_> = self
            .cache
            .iter()
            .filter(|(_, entry)| !policy.is_live(entry, now))
            .map(|(id, _)| id)
            .collect();

        for id in &expired {
            self.cache.invalidate(id.as_str()).await;
        }
        self.cache.run_pending_tasks().await;
        expired.len()
    }

    async fn entry_count(&self) -> usize {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count() as usize
    }
}

impl<R> Debug for MokaEntryStore<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaEntryStore")
            .field("name", &self.cache.name())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appmeta::domain::{AppMeta, EntryState};

    fn policy(positive_ms: u64, negative_ms: u64) -> ExpiryPolicy {
        ExpiryPolicy::new(
            Duration::from_millis(positive_ms),
            Duration::from_millis(negative_ms),
        )
    }

    #[tokio::test]
    async fn test_moka_store_put_and_get() {
        let store = MokaEntryStore::new("test", policy(60_000, 60_000));

        store
            .put("g".to_string(), CacheEntry::found(AppMeta::new("g", "Foo")))
            .await;
        store.put("x".to_string(), CacheEntry::not_found()).await;

        let found = store.get("g").await.unwrap();
        assert_eq!(found.state, EntryState::Found(AppMeta::new("g", "Foo")));
        let missing = store.get("x").await.unwrap();
        assert_eq!(missing.state, EntryState::NotFound);
        assert!(store.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_moka_store_overwrite_switches_class() {
        let store: MokaEntryStore<AppMeta> = MokaEntryStore::new("test", policy(60_000, 60_000));

        store.put("g".to_string(), CacheEntry::not_found()).await;
        store
            .put("g".to_string(), CacheEntry::found(AppMeta::new("g", "Foo")))
            .await;

        assert!(store.get("g").await.unwrap().is_found());
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_moka_store_evicts_per_class() {
        // Negative entries expire quickly, positive ones stay.
        let store = MokaEntryStore::new("test", policy(60_000, 50));

        store
            .put("g".to_string(), CacheEntry::found(AppMeta::new("g", "Foo")))
            .await;
        store.put("x".to_string(), CacheEntry::not_found()).await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.get("x").await.is_none());
        assert!(store.get("g").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_does_not_drive_moka_eviction() {
        let policy = policy(60_000, 60_000);
        let store = MokaEntryStore::new("test", policy);
        store.put("x".to_string(), CacheEntry::not_found()).await;

        tokio::time::advance(Duration::from_secs(120)).await;

        // Moka still holds the entry, but it is stale by the tokio clock.
        let entry: CacheEntry<AppMeta> = store.get("x").await.unwrap();
        assert!(!policy.is_live(&entry, tokio::time::Instant::now()));
    }

    #[tokio::test]
    async fn test_moka_store_purge_expired() {
        let store = MokaEntryStore::new("test", policy(60_000, 60_000));
        store
            .put("g".to_string(), CacheEntry::found(AppMeta::new("g", "Foo")))
            .await;
        store.put("x".to_string(), CacheEntry::not_found()).await;

        // A stricter policy than the one the store was built with.
        let strict = policy(60_000, 0);
        assert_eq!(store.purge_expired(&strict).await, 1);
        assert!(store.get("x").await.is_none());
        assert_eq!(store.entry_count().await, 1);
    }
}
