//! Caching layers
//!
//! - HashCache: TTL-based (info-hash, provider) availability verdicts
//! - Providers: memoized candidate lists from slow external scrapers

pub mod hash_cache;
pub mod providers;

pub use hash_cache::HashCacheStore;
pub use providers::{ExternalResultCache, ScrapeProvider};
