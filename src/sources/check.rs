//! Hash-availability checking
//!
//! Given a batch of info-hashes and a target vendor, figure out which of
//! them the vendor has cached. Verdicts already in the local hash cache are
//! served from it; only the remainder goes out to the network. Vendors with
//! a bulk endpoint are asked directly; the rest are covered by probing two
//! independent availability oracles concurrently and unioning their answers.
//! Fresh positives are written back to the cache off the request path.
//! Negatives are never recorded anywhere, so a miss today is re-probed
//! tomorrow.

use rand::seq::SliceRandom;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::cache::HashCacheStore;
use crate::config::{BatchPolicy, OracleConfig};
use crate::debrid::BulkCacheCheck;
use crate::models::{is_info_hash, normalize_hash, ProviderKey};

/// Largest batch any bulk endpoint or oracle accepts in one call
pub const BULK_BATCH_CAP: usize = 100;

fn hash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-fA-F0-9]{40}").unwrap())
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DmmResponse {
    #[serde(default)]
    available: Vec<DmmEntry>,
}

#[derive(Debug, Deserialize)]
struct DmmEntry {
    hash: String,
}

/// One availability check for one vendor and one piece of media. Holds the
/// media identity because the stremio-style oracles answer per title, not
/// per hash.
pub struct CacheCheckSession {
    provider: ProviderKey,
    imdb_id: String,
    season: Option<u32>,
    episode: Option<u32>,
    store: Arc<HashCacheStore>,
    oracles: OracleConfig,
    policy: BatchPolicy,
    client: reqwest::Client,
}

impl CacheCheckSession {
    pub fn new(
        provider: ProviderKey,
        imdb_id: impl Into<String>,
        season: Option<u32>,
        episode: Option<u32>,
        store: Arc<HashCacheStore>,
        oracles: OracleConfig,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            provider,
            imdb_id: imdb_id.into(),
            season,
            episode,
            store,
            oracles,
            policy,
            client: reqwest::Client::new(),
        }
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.oracles.probe_timeout_ms)
    }

    /// The stremio catalog path for this media
    fn media_path(&self) -> String {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => format!("series/{}:{}:{}.json", self.imdb_id, s, e),
            _ => format!("movie/{}.json", self.imdb_id),
        }
    }

    /// Returns the subset of `hashes` cached at this session's vendor.
    /// Local verdicts first, then the vendor bulk endpoint or the oracle
    /// pair for whatever is still unknown.
    pub async fn check_cache(
        &self,
        hashes: &[String],
        bulk: Option<&dyn BulkCacheCheck>,
    ) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for hash in hashes {
            let hash = normalize_hash(hash);
            if is_info_hash(&hash) && seen.insert(hash.clone()) {
                candidates.push(hash);
            }
        }

        let known: HashSet<String> = self
            .store
            .get_many(&candidates)
            .into_iter()
            .filter(|v| v.provider == self.provider)
            .map(|v| v.hash)
            .collect();

        let unknowns: Vec<String> = candidates
            .iter()
            .filter(|h| !known.contains(*h))
            .cloned()
            .collect();

        let mut cached: Vec<String> = candidates
            .iter()
            .filter(|h| known.contains(*h))
            .cloned()
            .collect();
        if unknowns.is_empty() {
            return cached;
        }

        let found = match bulk {
            Some(bulk) => self.check_bulk(&unknowns, bulk).await,
            None => self.check_oracles(&unknowns).await,
        };

        let positives: Vec<String> = unknowns
            .iter()
            .filter(|h| found.contains(*h))
            .cloned()
            .collect();

        if !positives.is_empty() {
            // write-back off the request path; a lost write just re-probes
            let store = self.store.clone();
            let provider = self.provider;
            let batch = positives.clone();
            tokio::spawn(async move {
                if let Err(e) = store.set_many(&batch, provider) {
                    tracing::warn!(provider = %provider, error = %e, "hash cache write-back failed");
                }
            });
        }

        cached.extend(positives);
        cached
    }

    /// Vendor bulk endpoint, applying the configured batch policy above
    /// the per-call cap
    async fn check_bulk(&self, unknowns: &[String], bulk: &dyn BulkCacheCheck) -> HashSet<String> {
        let mut found = HashSet::new();
        match self.policy {
            BatchPolicy::Sample => {
                let batch: Vec<String> = if unknowns.len() > BULK_BATCH_CAP {
                    unknowns
                        .choose_multiple(&mut rand::thread_rng(), BULK_BATCH_CAP)
                        .cloned()
                        .collect()
                } else {
                    unknowns.to_vec()
                };
                match bulk.check_cache(&batch).await {
                    Ok(set) => found.extend(set.into_iter().map(|h| normalize_hash(&h))),
                    Err(e) => {
                        tracing::debug!(provider = %self.provider, error = %e, "bulk cache check failed")
                    }
                }
            }
            BatchPolicy::Chunk => {
                for chunk in unknowns.chunks(BULK_BATCH_CAP) {
                    match bulk.check_cache(chunk).await {
                        Ok(set) => found.extend(set.into_iter().map(|h| normalize_hash(&h))),
                        Err(e) => {
                            tracing::debug!(provider = %self.provider, error = %e, "bulk cache check chunk failed")
                        }
                    }
                }
            }
        }
        found
    }

    /// Two oracles per vendor, probed concurrently; either answering is
    /// enough for a hash to count as cached.
    async fn check_oracles(&self, unknowns: &[String]) -> HashSet<String> {
        // a margin past the per-request timeout so slow DNS can't wedge
        // the whole check
        let deadline = self.probe_timeout() + Duration::from_secs(1);
        let (a, b) = match self.provider {
            ProviderKey::Ad => tokio::join!(
                tokio::time::timeout(deadline, self.probe_mediafusion()),
                tokio::time::timeout(deadline, self.probe_torz()),
            ),
            _ => tokio::join!(
                tokio::time::timeout(deadline, self.probe_torrentio()),
                tokio::time::timeout(deadline, self.probe_dmm(unknowns)),
            ),
        };
        let mut found = HashSet::new();
        for result in [a, b] {
            match result {
                Ok(set) => found.extend(set),
                Err(_) => tracing::debug!(provider = %self.provider, "oracle probe timed out"),
            }
        }
        found
    }

    /// Fetch a stremio-style stream list and keep the hashes of entries
    /// flagged as instantly available
    async fn probe_stremio(&self, base: &str, key: &str, marker: char) -> HashSet<String> {
        let url = if key.is_empty() {
            format!("{}/stream/{}", base, self.media_path())
        } else {
            format!("{}/{}/stream/{}", base, key, self.media_path())
        };
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout())
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "oracle probe failed");
                return HashSet::new();
            }
        };
        let streams: StreamsResponse = match response.json().await {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "oracle probe returned unexpected JSON");
                return HashSet::new();
            }
        };
        streams
            .streams
            .iter()
            .filter(|s| s.name.contains(marker))
            .filter_map(|s| s.url.as_deref())
            .filter_map(|u| hash_re().find_iter(u).last())
            .map(|m| normalize_hash(m.as_str()))
            .collect()
    }

    async fn probe_mediafusion(&self) -> HashSet<String> {
        self.probe_stremio(
            &self.oracles.mediafusion_url,
            &self.oracles.mediafusion_key,
            '⚡',
        )
        .await
    }

    async fn probe_torz(&self) -> HashSet<String> {
        self.probe_stremio(&self.oracles.torz_url, &self.oracles.torz_key, '⚡')
            .await
    }

    async fn probe_torrentio(&self) -> HashSet<String> {
        self.probe_stremio(&self.oracles.torrentio_url, &self.oracles.torrentio_key, '+')
            .await
    }

    /// DMM checks hashes directly, capped per call; above the cap a random
    /// sample is enough
    async fn probe_dmm(&self, unknowns: &[String]) -> HashSet<String> {
        let mut batch: Vec<&String> = unknowns.iter().collect();
        if batch.len() > BULK_BATCH_CAP {
            batch = batch
                .choose_multiple(&mut rand::thread_rng(), BULK_BATCH_CAP)
                .copied()
                .collect();
        }
        let url = format!("{}/api/availability/check", self.oracles.dmm_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.probe_timeout())
            .json(&json!({ "hashes": batch, "imdbId": self.imdb_id }))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "oracle probe failed");
                return HashSet::new();
            }
        };
        match response.json::<DmmResponse>().await {
            Ok(body) => body
                .available
                .into_iter()
                .map(|e| normalize_hash(&e.hash))
                .collect(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "oracle probe returned unexpected JSON");
                HashSet::new()
            }
        }
    }
}
