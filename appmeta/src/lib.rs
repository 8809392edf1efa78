//! Read-through lookup cache for application metadata.
//!
//! `CachingLookup` decorates any `AppResolver` backend, caching found records
//! and confirmed absences under separate TTLs while passing every other
//! backend error straight through.

pub mod domain;
pub mod lookup;
pub mod ports;
pub mod store;

pub use domain::{AppMeta, CacheEntry, EntryState, ExpiryPolicy};
pub use lookup::{CachingLookup, Janitor};
pub use ports::{AppResolver, EntryStore, StoreFactory};
pub use store::DashMapEntryStore;
