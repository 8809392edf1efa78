use appmeta::domain::ExpiryPolicy;
use appmeta::ports::{EntryStore, StoreFactory};
use appmeta::store::DashMapEntryStore;
use shared::config::{LookupConfig, StoreBackend};
use std::sync::Arc;

pub mod moka_cache;

pub use moka_cache::MokaEntryStore;

/// Creates the entry store named by `LookupConfig::store`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStoreFactory;

impl<R> StoreFactory<R> for DefaultStoreFactory
where
    R: Clone + Send + Sync + 'static,
{
    fn create_store(&self, config: &LookupConfig) -> Arc<dyn EntryStore<R>> {
        tracing::debug!(cache = %config.name, store = ?config.store, "Creating entry store");
        match config.store {
            StoreBackend::DashMap => Arc::new(DashMapEntryStore::new()),
            StoreBackend::Moka => {
                let policy = ExpiryPolicy::new(config.positive_ttl, config.negative_ttl);
                Arc::new(MokaEntryStore::new(&config.name, policy))
            }
        }
    }
}
