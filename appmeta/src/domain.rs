use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Application metadata as resolved by the platform API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMeta {
    pub guid: String,
    pub name: String,
    pub space_guid: String,
    pub space_name: String,
    pub org_guid: String,
    pub org_name: String,
}

impl AppMeta {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_space(mut self, guid: impl Into<String>, name: impl Into<String>) -> Self {
        self.space_guid = guid.into();
        self.space_name = name.into();
        self
    }

    pub fn with_org(mut self, guid: impl Into<String>, name: impl Into<String>) -> Self {
        self.org_guid = guid.into();
        self.org_name = name.into();
        self
    }
}

/// What a previous backend call established for an id.
/// A key with no entry is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryState<R> {
    Found(R),
    NotFound,
}

/// Immutable snapshot of one lookup outcome. Refreshing a key replaces the
/// whole entry, never its fields.
#[derive(Clone, Debug)]
pub struct CacheEntry<R> {
    pub state: EntryState<R>,
    pub inserted_at: Instant,
}

impl<R> CacheEntry<R> {
    pub fn found(record: R) -> Self {
        Self {
            state: EntryState::Found(record),
            inserted_at: Instant::now(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            state: EntryState::NotFound,
            inserted_at: Instant::now(),
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    pub fn is_found(&self) -> bool {
        matches!(self.state, EntryState::Found(_))
    }
}

/// Per-class time-to-live, fixed when the cache is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
}

impl ExpiryPolicy {
    pub fn new(positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            positive_ttl,
            negative_ttl,
        }
    }

    pub fn ttl_for<R>(&self, state: &EntryState<R>) -> Duration {
        match state {
            EntryState::Found(_) => self.positive_ttl,
            EntryState::NotFound => self.negative_ttl,
        }
    }

    /// An entry is live while its age is strictly below its TTL, so a zero
    /// TTL is never live.
    pub fn is_live<R>(&self, entry: &CacheEntry<R>, now: Instant) -> bool {
        entry.age(now) < self.ttl_for(&entry.state)
    }
}
