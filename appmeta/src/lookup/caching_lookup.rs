use crate::domain::{CacheEntry, EntryState, ExpiryPolicy};
use crate::lookup::janitor::Janitor;
use crate::ports::{AppResolver, EntryStore, StoreFactory};
use crate::store::DashMapEntryStore;
use async_trait::async_trait;
use dashmap::DashMap;
use shared::config::LookupConfig;
use shared::{Error, Result};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Read-through cache in front of an `AppResolver`.
///
/// Found records and confirmed absences are both cached, each with its own
/// TTL measured from the fetch that produced the entry. Any other backend
/// error is returned as-is and leaves the cache untouched, so callers can
/// retry without being served a false result.
///
/// Concurrent misses for the same id each reach the backend unless in-flight
/// coalescing is enabled in the config.
pub struct CachingLookup<R> {
    name: String,
    backend: Arc<dyn AppResolver<Record = R>>,
    store: Arc<dyn EntryStore<R>>,
    policy: ExpiryPolicy,
    // Per-id gates, present only when coalescing is enabled.
    in_flight: Option<InFlightMap>,
    janitor: Option<Janitor>,
}

impl<R> CachingLookup<R>
where
    R: Clone + Debug + Send + Sync + 'static,
{
    /// Wrap `backend` with an in-memory cache.
    ///
    /// A zero TTL disables caching for that class of result.
    pub fn new(
        backend: Arc<dyn AppResolver<Record = R>>,
        positive_ttl: Duration,
        negative_ttl: Duration,
        name: impl Into<String>,
    ) -> Result<Self> {
        let config = LookupConfig::new(name, positive_ttl, negative_ttl);
        Self::with_store(backend, Arc::new(DashMapEntryStore::new()), &config)
    }

    /// Build a cache whose store is chosen by `factory` from `config`.
    pub fn from_config(
        backend: Arc<dyn AppResolver<Record = R>>,
        config: &LookupConfig,
        factory: &dyn StoreFactory<R>,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_store(backend, factory.create_store(config), config)
    }

    /// Build a cache over an explicit store.
    ///
    /// Fails with `Error::Config` when the config is invalid, or when a
    /// janitor is configured outside a tokio runtime.
    pub fn with_store(
        backend: Arc<dyn AppResolver<Record = R>>,
        store: Arc<dyn EntryStore<R>>,
        config: &LookupConfig,
    ) -> Result<Self> {
        config.validate()?;

        let policy = ExpiryPolicy::new(config.positive_ttl, config.negative_ttl);
        let janitor = config
            .janitor_interval
            .map(|interval| Janitor::spawn(config.name.clone(), store.clone(), policy, interval))
            .transpose()?;

        tracing::info!(
            cache = %config.name,
            positive_ttl = ?config.positive_ttl,
            negative_ttl = ?config.negative_ttl,
            janitor_interval = ?config.janitor_interval,
            coalesce_in_flight = config.coalesce_in_flight,
            "Created caching app lookup"
        );

        Ok(Self {
            name: config.name.clone(),
            backend,
            store,
            policy,
            in_flight: config.coalesce_in_flight.then(DashMap::new),
            janitor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Resolve `id`, serving live cached outcomes without touching the backend.
    pub async fn resolve_by_id(&self, id: &str) -> Result<R> {
        if let Some(cached) = self.cached(id).await {
            return cached;
        }

        let Some(in_flight) = &self.in_flight else {
            return self.fetch(id).await;
        };

        // Declared before the permit so it drops after it, also on cancellation.
        let gate = InFlightGate::acquire(in_flight, id);
        let _permit = gate.gate.lock().await;

        // Whoever held the gate before us may already have stored the result.
        match self.cached(id).await {
            Some(cached) => cached,
            None => self.fetch(id).await,
        }
    }

    /// Start a janitor over this cache's store. The returned handle owns the
    /// task; dropping it stops the sweep.
    pub fn start_janitor(&self, interval: Duration) -> Result<Janitor> {
        Janitor::spawn(self.name.clone(), self.store.clone(), self.policy, interval)
    }

    pub fn has_janitor(&self) -> bool {
        self.janitor.as_ref().is_some_and(Janitor::is_running)
    }

    /// Drop expired entries now, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired(&self.policy).await
    }

    /// Number of entries held, live or not.
    pub async fn entry_count(&self) -> usize {
        self.store.entry_count().await
    }

    async fn cached(&self, id: &str) -> Option<Result<R>> {
        let entry = self.store.get(id).await?;

        if !self.policy.is_live(&entry, Instant::now()) {
            tracing::debug!(cache = %self.name, id, found = entry.is_found(), "Cached entry expired");
            return None;
        }

        match entry.state {
            EntryState::NotFound => {
                tracing::debug!(cache = %self.name, id, "Negative cache hit");
                Some(Err(Error::NotFound(id.to_string())))
            }
            EntryState::Found(record) => {
                tracing::debug!(cache = %self.name, id, "Cache hit");
                Some(Ok(record))
            }
        }
    }

    async fn fetch(&self, id: &str) -> Result<R> {
        tracing::debug!(cache = %self.name, id, "Cache miss, resolving from backend");

        match self.backend.resolve_by_id(id).await {
            Ok(record) => {
                self.store
                    .put(id.to_string(), CacheEntry::found(record.clone()))
                    .await;
                Ok(record)
            }
            Err(err) if err.is_not_found() => {
                self.store.put(id.to_string(), CacheEntry::not_found()).await;
                tracing::debug!(cache = %self.name, id, "Cached not-found result");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(cache = %self.name, id, error = %err, "Backend lookup failed, not caching");
                Err(err)
            }
        }
    }
}

type InFlightMap = DashMap<String, Arc<Mutex<()>>>;

/// Holds one reference to an id's gate and removes the gate from the map on
/// drop once no other lookup holds it.
struct InFlightGate<'a> {
    map: &'a InFlightMap,
    id: &'a str,
    gate: Arc<Mutex<()>>,
}

impl<'a> InFlightGate<'a> {
    fn acquire(map: &'a InFlightMap, id: &'a str) -> Self {
        let gate = map.entry(id.to_string()).or_default().value().clone();
        Self { map, id, gate }
    }
}

impl Drop for InFlightGate<'_> {
    fn drop(&mut self) {
        // The map and this guard hold the only references when nobody is waiting.
        self.map.remove_if(self.id, |_, g| Arc::strong_count(g) <= 2);
    }
}

#[async_trait]
impl<R> AppResolver for CachingLookup<R>
where
    R: Clone + Debug + Send + Sync + 'static,
{
    type Record = R;

    async fn resolve_by_id(&self, id: &str) -> Result<R> {
        CachingLookup::resolve_by_id(self, id).await
    }
}

impl<R> Debug for CachingLookup<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingLookup")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("coalesce_in_flight", &self.in_flight.is_some())
            .field("janitor", &self.janitor)
            .finish()
    }
}
