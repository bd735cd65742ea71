//! Source resolution
//!
//! Turns a chosen candidate into a playable URL. The branch is picked by
//! provenance: external torrents/NZBs go through a debrid vendor, cloud
//! items resolve with one vendor call, local references read straight off
//! the filesystem and hoster links are unrestricted when the vendor can.
//! Failures collapse into `Resolution::NotAvailable` so callers move on to
//! the next candidate; the cause is logged here. Transient vendor-side
//! transfers created while enumerating a pack are cleaned up off the
//! request path, per the vendor's cleanup style.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::debrid::{enabled_adapters, CleanupStyle, DebridAdapter};
use crate::models::{
    DirectLinkKind, MediaIdentity, NzbStatus, PackFile, Provenance, ProviderKey, Resolution,
    Source,
};
use crate::sources::utils::{
    extras_tokens_for, has_excluded_container, has_video_extension, is_extra, seas_ep_filter,
};

const NZB_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Why a candidate failed to resolve. Internal detail; callers only see
/// `Resolution::NotAvailable`.
#[derive(Debug, Error)]
pub enum ResolveFailure {
    #[error("no playable file in pack")]
    NoPlayableFiles,
    #[error("vendor returned an empty link")]
    EmptyLink,
    #[error("no adapter configured for {0}")]
    NoAdapter(ProviderKey),
    #[error("candidate carries no resolvable locator")]
    NoLocator,
}

/// Resolution engine over the configured vendor adapters
pub struct Resolver {
    config: Config,
    adapters: HashMap<ProviderKey, Arc<dyn DebridAdapter>>,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        let adapters = enabled_adapters(&config)
            .into_iter()
            .map(|a| (a.key(), a))
            .collect();
        Self { config, adapters }
    }

    /// Register an adapter directly (tests, custom deployments)
    pub fn with_adapter(mut self, adapter: Arc<dyn DebridAdapter>) -> Self {
        self.adapters.insert(adapter.key(), adapter);
        self
    }

    fn adapter(&self, key: ProviderKey) -> Result<Arc<dyn DebridAdapter>, ResolveFailure> {
        self.adapters
            .get(&key)
            .cloned()
            .ok_or(ResolveFailure::NoAdapter(key))
    }

    /// Resolve a candidate to its playable outcome
    pub async fn resolve(&self, source: &Source, meta: &MediaIdentity) -> Resolution {
        let result = match source.provenance {
            Provenance::ExternalScraper => self.resolve_external(source, meta).await,
            Provenance::DebridCloud(key) => self.resolve_cloud(key, source).await,
            Provenance::LocalFolders => resolve_local(source),
            Provenance::HosterDirect => self.resolve_hoster(source).await,
        };
        match result {
            Ok(url) if !url.is_empty() => Resolution::Url(url),
            Ok(_) => {
                tracing::debug!(name = %source.name, "{}", ResolveFailure::EmptyLink);
                Resolution::NotAvailable
            }
            Err(e) => {
                tracing::debug!(name = %source.name, error = %e, "resolution failed");
                Resolution::NotAvailable
            }
        }
    }

    async fn resolve_external(&self, source: &Source, meta: &MediaIdentity) -> Result<String> {
        let key = source.provider.ok_or(ResolveFailure::NoLocator)?;
        let adapter = self.adapter(key)?;
        if is_nzb(source) {
            return self.resolve_external_nzb(adapter, source, meta).await;
        }
        self.resolve_external_torrent(adapter, source, meta).await
    }

    async fn resolve_external_nzb(
        &self,
        adapter: Arc<dyn DebridAdapter>,
        source: &Source,
        meta: &MediaIdentity,
    ) -> Result<String> {
        let nzb = adapter
            .nzb()
            .ok_or(ResolveFailure::NoAdapter(adapter.key()))?;
        let store = self.config.store_to_cloud(adapter.key(), true);
        nzb.resolve_nzb(
            &source.url,
            source.hash.as_deref().unwrap_or_default(),
            store,
            &meta.title,
            meta.season,
            meta.episode,
        )
        .await
    }

    /// Enumerate the pack, pick the right file, unrestrict it and schedule
    /// cleanup of the enumeration transfer
    async fn resolve_external_torrent(
        &self,
        adapter: Arc<dyn DebridAdapter>,
        source: &Source,
        meta: &MediaIdentity,
    ) -> Result<String> {
        let locator = magnet_for(source)?;
        let hash = source.hash.as_deref().unwrap_or_default();
        let files = adapter.list_pack_files(&locator, hash).await?;
        let transfer_id = files.iter().find_map(|f| f.transfer_id.clone());

        let mut survivors = filter_playable(files, meta);
        if survivors.is_empty() {
            if let Some(id) = transfer_id {
                spawn_delete(adapter, id);
            }
            return Err(ResolveFailure::NoPlayableFiles.into());
        }
        survivors.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));

        let unrestricted = adapter.unrestrict(&survivors[0].link).await;
        let store = self.config.store_to_cloud(adapter.key(), false);
        match adapter.cleanup_style() {
            CleanupStyle::DeleteUnlessStored if !store => {
                if let Some(id) = transfer_id {
                    spawn_delete(adapter.clone(), id);
                }
            }
            CleanupStyle::StoreWhenRequested if store => {
                spawn_store(adapter.clone(), locator, source.name.clone());
            }
            _ => {}
        }
        unrestricted
    }

    /// Enumerate a pack for interactive selection; every playable file,
    /// episode filter not applied
    pub async fn browse_pack(&self, source: &Source, meta: &MediaIdentity) -> Resolution {
        let result = async {
            let key = source.provider.ok_or(ResolveFailure::NoLocator)?;
            let adapter = self.adapter(key)?;
            let locator = magnet_for(source)?;
            let hash = source.hash.as_deref().unwrap_or_default();
            let files = adapter.list_pack_files(&locator, hash).await?;

            let tokens = extras_tokens_for(&meta.title, &meta.aliases);
            let mut playable: Vec<PackFile> = files
                .into_iter()
                .filter(|f| has_video_extension(&f.filename))
                .filter(|f| !has_excluded_container(&f.filename))
                .filter(|f| !is_extra(&f.filename, &tokens))
                .collect();
            if playable.is_empty() {
                return Err(anyhow::Error::from(ResolveFailure::NoPlayableFiles));
            }
            playable.sort_by(|a, b| a.filename.to_lowercase().cmp(&b.filename.to_lowercase()));
            Ok(playable)
        }
        .await;
        match result {
            Ok(files) => Resolution::Selection(files),
            Err(e) => {
                tracing::debug!(name = %source.name, error = %e, "pack browse failed");
                Resolution::NotAvailable
            }
        }
    }

    /// Unrestrict one file picked out of a `browse_pack` selection
    pub async fn resolve_selected(&self, source: &Source, file: &PackFile) -> Resolution {
        let result = async {
            let key = source.provider.ok_or(ResolveFailure::NoLocator)?;
            let adapter = self.adapter(key)?;
            adapter.unrestrict(&file.link).await
        }
        .await;
        match result {
            Ok(url) if !url.is_empty() => Resolution::Url(url),
            Ok(_) => Resolution::NotAvailable,
            Err(e) => {
                tracing::debug!(name = %source.name, error = %e, "selection resolve failed");
                Resolution::NotAvailable
            }
        }
    }

    /// Ground-truth availability probe: enumerate and immediately discard.
    /// Used to double-check an oracle verdict before committing to playback.
    pub async fn probe_magnet_cached(&self, source: &Source) -> Result<bool> {
        let key = source.provider.ok_or(ResolveFailure::NoLocator)?;
        let adapter = self.adapter(key)?;
        let locator = magnet_for(source)?;
        let hash = source.hash.as_deref().unwrap_or_default();
        let files = adapter.list_pack_files(&locator, hash).await?;
        if let Some(id) = files.iter().find_map(|f| f.transfer_id.clone()) {
            spawn_delete(adapter, id);
        }
        Ok(files.iter().any(|f| has_video_extension(&f.filename)))
    }

    /// Poll an in-flight NZB transfer until it is ready, the caller's
    /// progress callback cancels, or `max_wait` runs out
    pub async fn nzb_transfer_wait<F>(
        &self,
        key: ProviderKey,
        transfer_id: &str,
        mut progress: F,
        max_wait: Duration,
    ) -> Result<NzbStatus>
    where
        F: FnMut(&NzbStatus) -> bool,
    {
        let adapter = self.adapter(key)?;
        let nzb = adapter.nzb().ok_or(ResolveFailure::NoAdapter(key))?;
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            let status = nzb.nzb_status(transfer_id).await?;
            if status.is_ready() || !progress(&status) {
                return Ok(status);
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("usenet transfer not ready after {:?}", max_wait);
            }
            tokio::time::sleep(NZB_POLL_INTERVAL).await;
        }
    }

    async fn resolve_cloud(&self, key: ProviderKey, source: &Source) -> Result<String> {
        if source.direct_debrid_link {
            return source
                .url_dl
                .clone()
                .ok_or_else(|| ResolveFailure::NoLocator.into());
        }
        let adapter = self.adapter(key)?;
        if let Some(id) = &source.cloud_id {
            let kind = source.direct_kind.unwrap_or(DirectLinkKind::Link);
            return adapter.unrestrict_cloud_item(id, kind).await;
        }
        if let Some(link) = &source.url_dl {
            return adapter.unrestrict(link).await;
        }
        Err(ResolveFailure::NoLocator.into())
    }

    async fn resolve_hoster(&self, source: &Source) -> Result<String> {
        // torrent-shaped hoster entries and non-capable vendors play the
        // raw URL
        if source.is_torrent() {
            return Ok(source.url.clone());
        }
        match source.provider {
            Some(key) if key.is_hoster_capable() => {
                let adapter = self.adapter(key)?;
                adapter.unrestrict(&source.url).await
            }
            _ => Ok(source.url.clone()),
        }
    }
}

/// `.strm` pointers hold the real URL as their content
fn resolve_local(source: &Source) -> Result<String> {
    if source.url.to_lowercase().ends_with(".strm") {
        let content = std::fs::read_to_string(&source.url)?;
        return Ok(content.trim().to_string());
    }
    Ok(source.url.clone())
}

fn is_nzb(source: &Source) -> bool {
    source.direct_kind == Some(DirectLinkKind::Usenet)
        || source.url.to_lowercase().contains(".nzb")
}

fn magnet_for(source: &Source) -> Result<String, ResolveFailure> {
    if source.url.starts_with("magnet:") {
        return Ok(source.url.clone());
    }
    source
        .to_magnet(&source.display_name)
        .ok_or(ResolveFailure::NoLocator)
}

/// Keep the files that could actually be this request's media: video
/// container, not an excluded one, and for episodes the one matching the
/// requested numbering. Movie requests drop extras instead.
fn filter_playable(files: Vec<PackFile>, meta: &MediaIdentity) -> Vec<PackFile> {
    let tokens = extras_tokens_for(&meta.title, &meta.aliases);
    files
        .into_iter()
        .filter(|f| has_video_extension(&f.filename))
        .filter(|f| !has_excluded_container(&f.filename))
        .filter(|f| match (meta.season, meta.episode) {
            (Some(s), Some(e)) => seas_ep_filter(s, e, &f.filename),
            _ => !is_extra(&f.filename, &tokens),
        })
        .collect()
}

fn spawn_delete(adapter: Arc<dyn DebridAdapter>, id: String) {
    tokio::spawn(async move {
        if let Err(e) = adapter.delete_transfer(&id).await {
            tracing::warn!(id = %id, error = %e, "transfer cleanup failed");
        }
    });
}

fn spawn_store(adapter: Arc<dyn DebridAdapter>, locator: String, name: String) {
    tokio::spawn(async move {
        let name = (!name.is_empty()).then_some(name);
        if let Err(e) = adapter.create_transfer(&locator, name.as_deref()).await {
            tracing::warn!(error = %e, "storing transfer to cloud failed");
        }
    });
}
