#![deny(clippy::all)]

use crate::domain::{CacheEntry, ExpiryPolicy};
use async_trait::async_trait;
use shared::Result;
use shared::config::LookupConfig;
use std::fmt::Debug;
use std::sync::Arc;

// Ports are the seams between the lookup cache, the remote backend it
// decorates and the map that holds its entries.

/// Port for the remote lookup client.
///
/// A backend signals confirmed absence with `Error::NotFound`; every other
/// error is treated as transient.
#[async_trait]
pub trait AppResolver: Send + Sync + 'static {
    type Record: Clone + Debug + Send + Sync + 'static;

    async fn resolve_by_id(&self, id: &str) -> Result<Self::Record>;
}

/// Port for the map holding cached lookup outcomes.
///
/// `put` must replace any existing entry for the key as a whole, so readers
/// observe either the old entry or the new one.
#[async_trait]
pub trait EntryStore<R>: Send + Sync + 'static {
    async fn get(&self, id: &str) -> Option<CacheEntry<R>>;
    async fn put(&self, id: String, entry: CacheEntry<R>);
    /// Drops entries the policy no longer considers live and returns how many.
    async fn purge_expired(&self, policy: &ExpiryPolicy) -> usize;
    async fn entry_count(&self) -> usize;
}

/// Port for creating entry stores from configuration
/// This allows different storage backends to be plugged in
pub trait StoreFactory<R>: Send + Sync + 'static {
    fn create_store(&self, config: &LookupConfig) -> Arc<dyn EntryStore<R>>;
}
