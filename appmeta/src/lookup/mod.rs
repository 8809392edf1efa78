pub mod caching_lookup;
pub mod janitor;

pub use caching_lookup::CachingLookup;
pub use janitor::Janitor;
