//! Debrid vendor adapters
//!
//! One adapter per vendor, all behind the `DebridAdapter` contract. Optional
//! capabilities (bulk cache check, NZB handling) are modeled as accessor
//! methods returning `Option`, so call sites branch on capability, never on
//! vendor names. The registry table associates each `ProviderKey` with its
//! display name, enabled flag and constructor in one place.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{DirectLinkKind, NzbStatus, PackFile, ProviderKey};

pub mod alldebrid;
pub mod easydebrid;
pub mod offcloud;
pub mod premiumize;
pub mod realdebrid;
pub mod torbox;

pub use alldebrid::AllDebrid;
pub use easydebrid::EasyDebrid;
pub use offcloud::Offcloud;
pub use premiumize::Premiumize;
pub use realdebrid::RealDebrid;
pub use torbox::TorBox;

/// How transient cloud transfers created during resolution are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStyle {
    /// Vendor bills by storage: delete the enumeration transfer unless the
    /// user asked to keep it
    DeleteUnlessStored,
    /// Vendor links are ephemeral API-side: re-add to the cloud library only
    /// when persistence is requested
    StoreWhenRequested,
    /// Nothing to clean up
    None,
}

/// Bulk cache-check capability. Vendors without it are routed through the
/// external oracle probes instead.
#[async_trait]
pub trait BulkCacheCheck: Send + Sync {
    /// Returns the subset of `hashes` the vendor reports as cached
    async fn check_cache(&self, hashes: &[String]) -> Result<HashSet<String>>;
}

/// NZB capability, for vendors with usenet backends
#[async_trait]
pub trait NzbResolver: Send + Sync {
    /// Resolve an NZB reference to a playable URL, letting the vendor match
    /// the requested title/season/episode among the transfer's files
    async fn resolve_nzb(
        &self,
        locator: &str,
        hash: &str,
        store_to_cloud: bool,
        title: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<String>;

    /// Poll an in-flight NZB transfer
    async fn nzb_status(&self, id: &str) -> Result<NzbStatus>;
}

/// Contract every vendor adapter implements. The vendor's REST protocol is
/// its own concern; callers only see this surface.
#[async_trait]
pub trait DebridAdapter: Send + Sync {
    fn key(&self) -> ProviderKey;

    /// Bulk cache-check capability, if the vendor exposes one
    fn bulk_cache_check(&self) -> Option<&dyn BulkCacheCheck> {
        None
    }

    /// NZB capability, if the vendor has a usenet backend
    fn nzb(&self) -> Option<&dyn NzbResolver> {
        None
    }

    fn cleanup_style(&self) -> CleanupStyle;

    /// Enumerate the files of a torrent/NZB pack. May create a transient
    /// transfer vendor-side; when it does, the returned files carry its id
    /// so the caller can schedule cleanup.
    async fn list_pack_files(&self, locator: &str, hash: &str) -> Result<Vec<PackFile>>;

    /// Convert a vendor link token into a directly fetchable URL
    async fn unrestrict(&self, link: &str) -> Result<String>;

    /// Resolve a cloud library item by its opaque id
    async fn unrestrict_cloud_item(&self, id: &str, _kind: DirectLinkKind) -> Result<String> {
        self.unrestrict(id).await
    }

    /// Add a locator to the vendor cloud; returns the transfer id
    async fn create_transfer(&self, locator: &str, name: Option<&str>) -> Result<String>;

    /// Remove a transfer from the vendor cloud
    async fn delete_transfer(&self, id: &str) -> Result<()>;
}

/// Registry row tying a provider key to its adapter constructor
pub struct ProviderEntry {
    pub key: ProviderKey,
    pub build: fn(&Config) -> Arc<dyn DebridAdapter>,
}

/// The full vendor table, one row per `ProviderKey`
pub static REGISTRY: &[ProviderEntry] = &[
    ProviderEntry {
        key: ProviderKey::Rd,
        build: |c| Arc::new(RealDebrid::new(c.api_key(ProviderKey::Rd).unwrap_or_default())),
    },
    ProviderEntry {
        key: ProviderKey::Pm,
        build: |c| Arc::new(Premiumize::new(c.api_key(ProviderKey::Pm).unwrap_or_default())),
    },
    ProviderEntry {
        key: ProviderKey::Ad,
        build: |c| Arc::new(AllDebrid::new(c.api_key(ProviderKey::Ad).unwrap_or_default())),
    },
    ProviderEntry {
        key: ProviderKey::Tb,
        build: |c| Arc::new(TorBox::new(c.api_key(ProviderKey::Tb).unwrap_or_default())),
    },
    ProviderEntry {
        key: ProviderKey::Oc,
        build: |c| Arc::new(Offcloud::new(c.api_key(ProviderKey::Oc).unwrap_or_default())),
    },
    ProviderEntry {
        key: ProviderKey::Ed,
        build: |c| Arc::new(EasyDebrid::new(c.api_key(ProviderKey::Ed).unwrap_or_default())),
    },
];

/// Construct the adapter for one vendor
pub fn adapter_for(key: ProviderKey, config: &Config) -> Arc<dyn DebridAdapter> {
    let entry = REGISTRY
        .iter()
        .find(|e| e.key == key)
        .unwrap_or(&REGISTRY[0]);
    (entry.build)(config)
}

/// Adapters for every vendor the user has enabled
pub fn enabled_adapters(config: &Config) -> Vec<Arc<dyn DebridAdapter>> {
    config
        .enabled_providers()
        .into_iter()
        .map(|key| adapter_for(key, config))
        .collect()
}
