//! Configuration management for resolvarr
//!
//! Handles config file loading/saving: per-vendor credentials and flags,
//! cache TTLs, oracle endpoints and the bulk batch policy.
//! Config is stored at ~/.config/resolvarr/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::ProviderKey;

/// How to handle bulk cache-check batches above the vendor cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Random subsample down to the cap; a representative sample is enough
    /// and keeps call volume polite
    #[default]
    Sample,
    /// Submit sequential chunks until the whole set is covered
    Chunk,
}

/// Per-vendor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    /// Keep resolved torrent transfers in the vendor cloud
    pub store_torrents_to_cloud: bool,
    /// Keep resolved usenet transfers in the vendor cloud
    pub store_usenet_to_cloud: bool,
}

/// Cache-oracle endpoints and deployment keys. Overridable for tests and
/// self-hosted mirrors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub mediafusion_url: String,
    pub mediafusion_key: String,
    pub torz_url: String,
    pub torz_key: String,
    pub torrentio_url: String,
    pub torrentio_key: String,
    pub dmm_url: String,
    /// Per-probe timeout in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            mediafusion_url: "https://mediafusion.elfhosted.com".to_string(),
            mediafusion_key: String::new(),
            torz_url: "https://stremthru.elfhosted.com".to_string(),
            torz_key: String::new(),
            torrentio_url: "https://torrentio.strem.fun".to_string(),
            torrentio_key: String::new(),
            dmm_url: "https://debridmediamanager.com".to_string(),
            probe_timeout_ms: 7050,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Keyed by provider short code ("rd", "pm", ...)
    pub providers: HashMap<String, ProviderConfig>,
    pub oracles: OracleConfig,
    pub batch_policy: BatchPolicy,
    /// Hash-availability verdict TTL in hours
    pub hash_cache_ttl_hours: u64,
    /// Aggregation-cache expiry per pack scope, in hours
    pub single_expiry_hours: u64,
    pub season_expiry_hours: u64,
    pub show_expiry_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            oracles: OracleConfig::default(),
            batch_policy: BatchPolicy::default(),
            hash_cache_ttl_hours: 3,
            single_expiry_hours: 12,
            season_expiry_hours: 48,
            show_expiry_hours: 48,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/resolvarr/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("resolvarr").join("config.toml"))
    }

    /// Get data file path (~/.local/share/resolvarr/<name>)
    pub fn data_path(name: &str) -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("resolvarr").join(name))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path =
            Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Settings for one vendor, defaults when absent
    pub fn provider(&self, key: ProviderKey) -> ProviderConfig {
        self.providers.get(key.short()).cloned().unwrap_or_default()
    }

    /// Set a vendor's settings
    pub fn set_provider(&mut self, key: ProviderKey, settings: ProviderConfig) {
        self.providers.insert(key.short().to_string(), settings);
    }

    /// Vendors with the enabled flag set
    pub fn enabled_providers(&self) -> Vec<ProviderKey> {
        ProviderKey::ALL
            .into_iter()
            .filter(|p| self.provider(*p).enabled)
            .collect()
    }

    pub fn api_key(&self, key: ProviderKey) -> Option<String> {
        self.provider(key).api_key
    }

    /// Whether a resolved transfer for this vendor should stay in the cloud
    pub fn store_to_cloud(&self, key: ProviderKey, usenet: bool) -> bool {
        let p = self.provider(key);
        if usenet {
            p.store_usenet_to_cloud
        } else {
            p.store_torrents_to_cloud
        }
    }
}
