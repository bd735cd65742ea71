//! Hash-availability cache
//!
//! Persistent mapping from (info-hash, provider) to a positive cached
//! verdict with an expiry. Only positive verdicts are ever stored: uncached
//! status is inferred from absence, so a stale "not cached" observation can
//! never poison future availability. Entries past the TTL are simply absent
//! from reads.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use crate::models::{normalize_hash, unix_now, CacheVerdict, ProviderKey};

/// On-disk entry shape
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVerdict {
    hash: String,
    provider: ProviderKey,
    recorded_at: u64,
}

/// Shared store of hash-availability verdicts. Safe for concurrent readers
/// and one writer per write batch; verdicts are monotone-additive, so
/// interleaved writes never race on a read-modify-write.
pub struct HashCacheStore {
    ttl: Duration,
    path: Option<PathBuf>,
    entries: RwLock<HashMap<(String, ProviderKey), u64>>,
}

impl HashCacheStore {
    /// In-memory store (tests, ephemeral sessions)
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            ttl,
            path: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store backed by a JSON file; loads whatever is already on disk.
    pub fn with_path(path: PathBuf, ttl: Duration) -> Self {
        let entries = Self::load_file(&path).unwrap_or_default();
        Self {
            ttl,
            path: Some(path),
            entries: RwLock::new(entries),
        }
    }

    fn load_file(path: &PathBuf) -> Option<HashMap<(String, ProviderKey), u64>> {
        let raw = std::fs::read_to_string(path).ok()?;
        let stored: Vec<StoredVerdict> = serde_json::from_str(&raw).ok()?;
        Some(
            stored
                .into_iter()
                .map(|v| ((v.hash, v.provider), v.recorded_at))
                .collect(),
        )
    }

    fn is_fresh(&self, recorded_at: u64) -> bool {
        unix_now().saturating_sub(recorded_at) < self.ttl.as_secs()
    }

    /// Fetch all verdicts present for the given hashes, across providers.
    /// Expired entries are not returned; freshness is this store's concern.
    pub fn get_many(&self, hashes: &[String]) -> Vec<CacheVerdict> {
        let entries = match self.entries.read() {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        for hash in hashes {
            let hash = normalize_hash(hash);
            for provider in ProviderKey::ALL {
                if let Some(&recorded_at) = entries.get(&(hash.clone(), provider)) {
                    if self.is_fresh(recorded_at) {
                        out.push(CacheVerdict {
                            hash: hash.clone(),
                            provider,
                            cached: true,
                            recorded_at,
                        });
                    }
                }
            }
        }
        out
    }

    /// Record positive verdicts for a batch of hashes. There is no negative
    /// counterpart: a hash not found cached is left absent and will be
    /// re-probed by the next check.
    pub fn set_many(&self, hashes: &[String], provider: ProviderKey) -> Result<()> {
        let now = unix_now();
        {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| anyhow::anyhow!("hash cache lock poisoned"))?;
            entries.retain(|_, recorded_at| self.is_fresh(*recorded_at));
            for hash in hashes {
                entries.insert((normalize_hash(hash), provider), now);
            }
        }
        self.persist()
    }

    /// Rewrite the backing file if there is one. Best effort by contract;
    /// a failed persist only means the next call repeats the probe.
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let stored: Vec<StoredVerdict> = {
            let entries = self
                .entries
                .read()
                .map_err(|_| anyhow::anyhow!("hash cache lock poisoned"))?;
            entries
                .iter()
                .map(|((hash, provider), recorded_at)| StoredVerdict {
                    hash: hash.clone(),
                    provider: *provider,
                    recorded_at: *recorded_at,
                })
                .collect()
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("creating hash cache directory")?;
        }
        let json = serde_json::to_string(&stored)?;
        std::fs::write(path, json).context("writing hash cache file")?;
        Ok(())
    }
}
