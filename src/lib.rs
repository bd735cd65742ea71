//! resolvarr - debrid source checking and resolution
//!
//! Decides which torrent/NZB candidates are instantly available at each
//! debrid vendor and turns a chosen candidate into a playable URL.
//!
//! # Modules
//!
//! - `models` - Shared data structures (providers, sources, packs, verdicts)
//! - `config` - Configuration file handling
//! - `cache` - Hash-availability cache and scraper result cache
//! - `debrid` - One adapter per debrid vendor, behind a common contract
//! - `sources` - Cache-check orchestration and source resolution

pub mod cache;
pub mod config;
pub mod debrid;
pub mod models;
pub mod sources;

// Re-export commonly used types
pub use models::{
    CacheVerdict, MediaIdentity, MediaType, PackFile, PackKind, PackScope, Provenance,
    ProviderKey, Quality, QualityTally, Resolution, Source,
};

pub use cache::{ExternalResultCache, HashCacheStore, ScrapeProvider};
pub use config::{BatchPolicy, Config};
pub use debrid::{adapter_for, enabled_adapters, DebridAdapter};
pub use sources::{CacheCheckSession, Resolver};
