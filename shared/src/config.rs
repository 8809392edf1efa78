use crate::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Which `EntryStore` implementation backs a lookup cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    DashMap,
    Moka,
}

impl std::str::FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashmap" => Ok(StoreBackend::DashMap),
            "moka" => Ok(StoreBackend::Moka),
            other => Err(Error::Config(format!("unknown store backend '{other}'"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LookupConfig {
    pub name: String,
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    pub janitor_interval: Option<Duration>,
    pub coalesce_in_flight: bool,
    pub store: StoreBackend,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            positive_ttl: Duration::from_secs(Self::DEFAULT_CACHE_DURATION_SECS),
            negative_ttl: Duration::from_secs(Self::DEFAULT_CACHE_RETRY_DELAY_SECS),
            janitor_interval: None,
            coalesce_in_flight: false,
            store: StoreBackend::default(),
        }
    }
}

impl LookupConfig {
    const DEFAULT_NAME: &'static str = "appmeta";
    const DEFAULT_CACHE_DURATION_SECS: u64 = 120;
    const DEFAULT_CACHE_RETRY_DELAY_SECS: u64 = 20;

    pub fn new(name: impl Into<String>, positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            name: name.into(),
            positive_ttl,
            negative_ttl,
            ..Self::default()
        }
    }

    pub fn with_janitor(mut self, interval: Duration) -> Self {
        self.janitor_interval = Some(interval);
        self
    }

    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_in_flight = enabled;
        self
    }

    pub fn with_store(mut self, store: StoreBackend) -> Self {
        self.store = store;
        self
    }

    /// Reads a `.env` file if one exists, then the process environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment variables from {}", path.display()),
            Err(_) => info!("No .env file found, using system environment variables"),
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset keys fall back to defaults,
    /// malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let name = lookup("APPMETA_CACHE_NAME").unwrap_or(defaults.name);
        let positive_ttl = parse_secs(&lookup, "APPMETA_CACHE_DURATION_SECS")?
            .unwrap_or(defaults.positive_ttl);
        let negative_ttl = parse_secs(&lookup, "APPMETA_CACHE_RETRY_DELAY_SECS")?
            .unwrap_or(defaults.negative_ttl);
        let janitor_interval = parse_secs(&lookup, "APPMETA_JANITOR_INTERVAL_SECS")?;
        let coalesce_in_flight = match lookup("APPMETA_COALESCE_IN_FLIGHT") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                Error::Config(format!("APPMETA_COALESCE_IN_FLIGHT: expected true/false, got '{raw}'"))
            })?,
            None => defaults.coalesce_in_flight,
        };
        let store = match lookup("APPMETA_STORE") {
            Some(raw) => raw.parse()?,
            None => defaults.store,
        };

        if positive_ttl.is_zero() || negative_ttl.is_zero() {
            warn!(
                cache = %name,
                "a zero TTL disables caching for that result class"
            );
        }

        let config = Self {
            name,
            positive_ttl,
            negative_ttl,
            janitor_interval,
            coalesce_in_flight,
            store,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("cache name must not be empty".to_string()));
        }
        if matches!(self.janitor_interval, Some(interval) if interval.is_zero()) {
            return Err(Error::Config(
                "janitor interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| Error::Config(format!("{key}: expected non-negative seconds, got '{raw}'")))
}
