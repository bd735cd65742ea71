//! CLI command implementations
//!
//! Each handler takes its parsed arguments plus the output helper and
//! returns a semantic exit code. All network work happens here; `cli`
//! stays parse-only.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::HashCacheStore;
use crate::cli::{CheckCmd, DisableCmd, EnableCmd, ExitCode, Output, ResolveCmd};
use crate::config::Config;
use crate::debrid::{adapter_for, REGISTRY};
use crate::models::{
    is_info_hash, normalize_hash, MediaIdentity, Provenance, ProviderKey, Resolution, Source,
};
use crate::sources::{CacheCheckSession, Resolver};

#[derive(Debug, Serialize)]
struct ProviderStatus {
    key: &'static str,
    name: &'static str,
    enabled: bool,
    has_api_key: bool,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    provider: &'static str,
    checked: usize,
    cached: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResolveResult {
    url: String,
}

fn parse_provider(s: &str, output: &Output) -> Result<ProviderKey, ExitCode> {
    ProviderKey::parse(s).ok_or_else(|| {
        output.error(
            format!("unknown provider '{}' (rd, pm, ad, tb, oc, ed)", s),
            ExitCode::InvalidArgs,
        )
    })
}

/// List every vendor with its configuration status
pub fn providers_cmd(output: &Output) -> ExitCode {
    let config = Config::load();
    let statuses: Vec<ProviderStatus> = REGISTRY
        .iter()
        .map(|entry| {
            let settings = config.provider(entry.key);
            ProviderStatus {
                key: entry.key.short(),
                name: entry.key.display_name(),
                enabled: settings.enabled,
                has_api_key: settings.api_key.is_some(),
            }
        })
        .collect();
    match output.print(statuses) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}

/// Enable a vendor, storing its key and cloud-persistence flags
pub fn enable_cmd(cmd: EnableCmd, output: &Output) -> ExitCode {
    let key = match parse_provider(&cmd.provider, output) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let mut config = Config::load();
    let mut settings = config.provider(key);
    settings.enabled = true;
    if cmd.api_key.is_some() {
        settings.api_key = cmd.api_key;
    }
    settings.store_torrents_to_cloud = cmd.store_torrents;
    settings.store_usenet_to_cloud = cmd.store_usenet;
    config.set_provider(key, settings);
    match config.save() {
        Ok(()) => {
            output.info(format!("{} enabled", key));
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}

pub fn disable_cmd(cmd: DisableCmd, output: &Output) -> ExitCode {
    let key = match parse_provider(&cmd.provider, output) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let mut config = Config::load();
    let mut settings = config.provider(key);
    settings.enabled = false;
    config.set_provider(key, settings);
    match config.save() {
        Ok(()) => {
            output.info(format!("{} disabled", key));
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}

/// Run a cache check for one vendor over a batch of hashes
pub async fn check_cmd(cmd: CheckCmd, output: &Output) -> ExitCode {
    if let Err(e) = crate::cli::validate_imdb_id(&cmd.imdb_id) {
        return output.error(e, ExitCode::InvalidArgs);
    }
    let key = match parse_provider(&cmd.provider, output) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let config = Config::load();
    if config.api_key(key).is_none() {
        return output.error(
            format!("{} has no API key configured", key),
            ExitCode::ProviderNotConfigured,
        );
    }

    let hashes = cmd.hash_list();
    if hashes.is_empty() {
        return output.error("no hashes given", ExitCode::InvalidArgs);
    }

    let ttl = Duration::from_secs(config.hash_cache_ttl_hours * 3600);
    let store = match Config::data_path("hash_cache.json") {
        Some(path) => Arc::new(HashCacheStore::with_path(path, ttl)),
        None => Arc::new(HashCacheStore::in_memory(ttl)),
    };
    let adapter = adapter_for(key, &config);
    let session = CacheCheckSession::new(
        key,
        cmd.imdb_id.clone(),
        cmd.season,
        cmd.episode,
        store,
        config.oracles.clone(),
        config.batch_policy,
    );
    let cached = session.check_cache(&hashes, adapter.bulk_cache_check()).await;

    let result = CheckResult {
        provider: key.short(),
        checked: hashes.len(),
        cached,
    };
    match output.print(result) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(e.to_string(), ExitCode::Error),
    }
}

/// Resolve one locator through one vendor
pub async fn resolve_cmd(cmd: ResolveCmd, output: &Output) -> ExitCode {
    let key = match parse_provider(&cmd.provider, output) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let config = Config::load();
    if config.api_key(key).is_none() {
        return output.error(
            format!("{} has no API key configured", key),
            ExitCode::ProviderNotConfigured,
        );
    }

    let source = source_for_locator(&cmd.locator, key, &cmd.title);
    let meta = match (cmd.season, cmd.episode) {
        (Some(s), Some(e)) => MediaIdentity::episode(cmd.title.clone(), "", s, e),
        _ => MediaIdentity::movie(cmd.title.clone(), 0, ""),
    };

    let adapter = adapter_for(key, &config);
    let resolver = Resolver::new(config).with_adapter(adapter);
    match resolver.resolve(&source, &meta).await {
        Resolution::Url(url) => match output.print(ResolveResult { url }) {
            Ok(()) => ExitCode::Success,
            Err(e) => output.error(e.to_string(), ExitCode::Error),
        },
        Resolution::Selection(files) => match output.print(files) {
            Ok(()) => ExitCode::Success,
            Err(e) => output.error(e.to_string(), ExitCode::Error),
        },
        Resolution::NotAvailable => output.error("nothing resolved", ExitCode::NotAvailable),
    }
}

/// Shape a CLI locator into a candidate: magnets and bare hashes are
/// external torrents, anything else a direct hoster link
fn source_for_locator(locator: &str, key: ProviderKey, title: &str) -> Source {
    let normalized = normalize_hash(locator);
    let mut source = if locator.starts_with("magnet:") {
        let hash = hash_from_magnet(locator).unwrap_or_default();
        Source::external_torrent(key, locator, hash)
    } else if is_info_hash(&normalized) {
        Source::external_torrent(key, "", normalized)
    } else {
        let mut s = Source::external_torrent(key, locator, "");
        s.provenance = Provenance::HosterDirect;
        s.hash = None;
        s
    };
    source.display_name = title.to_string();
    source.name = title.to_string();
    source
}

fn hash_from_magnet(magnet: &str) -> Option<String> {
    let start = magnet.find("btih:")? + "btih:".len();
    let rest = &magnet[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    let hash = normalize_hash(&rest[..end]);
    is_info_hash(&hash).then_some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_from_magnet() {
        let magnet = "magnet:?xt=urn:btih:ABCDEF0123456789ABCDEF0123456789ABCDEF01&dn=x";
        assert_eq!(
            hash_from_magnet(magnet).as_deref(),
            Some("abcdef0123456789abcdef0123456789abcdef01")
        );
        assert_eq!(hash_from_magnet("magnet:?xt=urn:btih:short"), None);
        assert_eq!(hash_from_magnet("https://x"), None);
    }

    #[test]
    fn test_source_for_locator_shapes() {
        let hash = "abcdef0123456789abcdef0123456789abcdef01";
        let source = source_for_locator(hash, ProviderKey::Rd, "T");
        assert_eq!(source.provenance, Provenance::ExternalScraper);
        assert_eq!(source.hash.as_deref(), Some(hash));

        let hoster = source_for_locator("https://hoster/file", ProviderKey::Rd, "T");
        assert_eq!(hoster.provenance, Provenance::HosterDirect);
        assert!(hoster.hash.is_none());
    }
}
