//! External scraper result cache
//!
//! Scraping an external provider is the slowest step of a search, so raw
//! candidate lists are memoized per (provider, media identity, pack scope).
//! Normalization happens once at the write boundary; episode-range and
//! last-season filters are applied at read time because the requested
//! episode varies per read against one cached pack entry. Pack sizes stay
//! stored as totals and are amortized by the divider current at read time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    normalize_hash, unix_now, MediaIdentity, PackScope, Quality, QualityTally, Source,
};
use crate::sources::utils::{clean_file_name, get_file_info};

/// External scraping collaborator. Implementations own the per-site HTTP and
/// parsing; this crate only consumes the candidate lists they produce.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Single-title candidates (movie, or one episode)
    async fn sources(&self, meta: &MediaIdentity) -> anyhow::Result<Vec<Source>>;

    /// Pack candidates at season or show granularity
    async fn sources_packs(
        &self,
        meta: &MediaIdentity,
        scope: PackScope,
    ) -> anyhow::Result<Vec<Source>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: String,
    tmdb_id: String,
    imdb_id: String,
    /// Absent for show scope
    season: Option<u32>,
    /// Absent for season and show scope
    episode: Option<u32>,
}

impl CacheKey {
    fn new(provider: &str, meta: &MediaIdentity, scope: PackScope) -> Self {
        let (season, episode) = match scope {
            PackScope::Single => (meta.season, meta.episode),
            PackScope::Season => (meta.season, None),
            PackScope::Show => (None, None),
        };
        Self {
            provider: provider.to_string(),
            tmdb_id: meta.tmdb_id.clone(),
            imdb_id: meta.imdb_id.clone(),
            season,
            episode,
        }
    }
}

struct Entry {
    sources: Vec<Source>,
    expires_at: u64,
}

/// Memoized external provider results with scope-dependent expiry
pub struct ExternalResultCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    single_expiry: Duration,
    season_expiry: Duration,
    show_expiry: Duration,
}

impl ExternalResultCache {
    pub fn new(single_expiry: Duration, season_expiry: Duration, show_expiry: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            single_expiry,
            season_expiry,
            show_expiry,
        }
    }

    fn expiry_for(&self, scope: PackScope) -> Duration {
        match scope {
            PackScope::Single => self.single_expiry,
            PackScope::Season => self.season_expiry,
            PackScope::Show => self.show_expiry,
        }
    }

    /// Serve the candidate list from cache, scraping on miss. Returned lists
    /// are already narrowed to the requested episode/season; the per-request
    /// quality histogram is updated from what this request actually sees.
    pub async fn get_or_compute(
        &self,
        scraper: &dyn ScrapeProvider,
        meta: &MediaIdentity,
        scope: PackScope,
        tally: &mut QualityTally,
    ) -> Vec<Source> {
        let key = CacheKey::new(scraper.name(), meta, scope);

        let cached = self.lookup(&key);
        let sources = match cached {
            Some(sources) => sources,
            None => {
                let scraped = self.scrape(scraper, meta, scope).await;
                let normalized = normalize_sources(scraped, scraper.name());
                self.store(key, &normalized, scope);
                normalized
            }
        };

        let filtered = apply_read_filters(sources, meta, scope);
        for source in &filtered {
            tally.bump(source.quality);
        }
        filtered
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<Source>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        if entry.expires_at <= unix_now() {
            return None;
        }
        Some(entry.sources.clone())
    }

    fn store(&self, key: CacheKey, sources: &[Source], scope: PackScope) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };
        let now = unix_now();
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key,
            Entry {
                sources: sources.to_vec(),
                expires_at: now + self.expiry_for(scope).as_secs(),
            },
        );
    }

    async fn scrape(
        &self,
        scraper: &dyn ScrapeProvider,
        meta: &MediaIdentity,
        scope: PackScope,
    ) -> Vec<Source> {
        let result = match scope {
            PackScope::Single => scraper.sources(meta).await,
            PackScope::Season | PackScope::Show => scraper.sources_packs(meta, scope).await,
        };
        match result {
            Ok(sources) => sources,
            Err(e) => {
                warn!(provider = scraper.name(), error = %e, "scrape failed; treating as empty");
                Vec::new()
            }
        }
    }
}

/// One-time normalization at the cache write boundary: canonical hash form,
/// clean display name, quality/info classification. Upstream scrapers hand
/// over loose data; nothing untyped survives past this point.
fn normalize_sources(sources: Vec<Source>, provider: &str) -> Vec<Source> {
    sources
        .into_iter()
        .map(|mut source| {
            if let Some(hash) = source.hash.take() {
                source.hash = Some(normalize_hash(&hash));
            }
            if source.display_name.is_empty() {
                let basis = if source.name.is_empty() {
                    &source.url
                } else {
                    &source.name
                };
                source.display_name = clean_file_name(basis);
            }
            if source.quality == Quality::Unknown || source.info.is_empty() {
                let basis = if source.name.is_empty() {
                    &source.url
                } else {
                    &source.name
                };
                let (quality, info) = get_file_info(basis);
                if source.quality == Quality::Unknown {
                    source.quality = quality;
                }
                if source.info.is_empty() {
                    source.info = info.join(" | ");
                }
            }
            debug!(provider, name = %source.display_name, "normalized candidate");
            source
        })
        .collect()
}

/// Narrow a cached pack list to the episode/season being requested right now
fn apply_read_filters(sources: Vec<Source>, meta: &MediaIdentity, scope: PackScope) -> Vec<Source> {
    match scope {
        PackScope::Single => sources,
        PackScope::Season => {
            let Some(episode) = meta.episode else {
                return sources;
            };
            sources
                .into_iter()
                .filter(|s| match (s.episode_start, s.episode_end) {
                    (Some(start), Some(end)) => start <= episode && episode <= end,
                    // full-season packs carry no range
                    _ => true,
                })
                .collect()
        }
        PackScope::Show => {
            let Some(season) = meta.season else {
                return sources;
            };
            sources
                .into_iter()
                .filter(|s| s.last_season.map_or(true, |last| last >= season))
                .collect()
        }
    }
}
