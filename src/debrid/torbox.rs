//! TorBox adapter
//!
//! The only vendor here with both a torrent and a usenet backend. Link
//! tokens are `"{transfer_id}:{file_id}"` pairs fed to the requestdl
//! endpoints. Exposes the `checkcached` bulk endpoint.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;

use super::{BulkCacheCheck, CleanupStyle, DebridAdapter, NzbResolver};
use crate::models::{DirectLinkKind, NzbStatus, PackFile, ProviderKey};
use crate::sources::utils::{has_video_extension, seas_ep_filter};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct CachedEntry {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTransfer {
    #[serde(alias = "usenetdownload_id", alias = "torrent_id")]
    id: u64,
}

#[derive(Debug, Deserialize)]
struct TransferFile {
    id: u64,
    #[serde(alias = "short_name")]
    name: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct TransferInfo {
    #[serde(default)]
    files: Vec<TransferFile>,
    #[serde(default)]
    download_state: String,
    #[serde(default)]
    progress: f32,
    #[serde(default)]
    eta: Option<String>,
}

/// Split a `"{transfer}:{file}"` link token
fn split_token(token: &str) -> Result<(&str, &str)> {
    token
        .split_once(':')
        .context("malformed torbox link token")
}

pub struct TorBox {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TorBox {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://api.torbox.app/v1/api", api_key)
    }

    /// Custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let envelope: Envelope<T> = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", self.bearer())
            .query(params)
            .send()
            .await
            .with_context(|| format!("torbox {} failed", path))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("torbox {} returned unexpected JSON", path))?;
        Ok(envelope.data)
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let envelope: Envelope<T> = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", self.bearer())
            .form(form)
            .send()
            .await
            .with_context(|| format!("torbox {} failed", path))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("torbox {} returned unexpected JSON", path))?;
        Ok(envelope.data)
    }

    async fn request_download(&self, path: &str, transfer_id: &str, file_id: &str) -> Result<String> {
        let id_param = match path {
            "/usenet/requestdl" => "usenet_id",
            "/webdl/requestdl" => "web_id",
            _ => "torrent_id",
        };
        self.get_json::<String>(path, &[(id_param, transfer_id), ("file_id", file_id)])
            .await
    }

    async fn transfer_files(&self, list_path: &str, id: &str) -> Result<TransferInfo> {
        self.get_json(list_path, &[("id", id), ("bypass_cache", "true")])
            .await
    }
}

#[async_trait]
impl BulkCacheCheck for TorBox {
    async fn check_cache(&self, hashes: &[String]) -> Result<HashSet<String>> {
        let joined = hashes.join(",");
        let entries: Vec<CachedEntry> = self
            .get_json(
                "/torrents/checkcached",
                &[("hash", joined.as_str()), ("format", "list"), ("list_files", "false")],
            )
            .await?;
        Ok(entries.into_iter().map(|e| e.hash).collect())
    }
}

#[async_trait]
impl NzbResolver for TorBox {
    async fn resolve_nzb(
        &self,
        locator: &str,
        _hash: &str,
        store_to_cloud: bool,
        title: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<String> {
        let created: CreatedTransfer = self
            .post_form("/usenet/createusenetdownload", &[("link", locator), ("name", title)])
            .await?;
        let transfer_id = created.id.to_string();

        let result = async {
            let info = self.transfer_files("/usenet/mylist", &transfer_id).await?;
            let mut files: Vec<&TransferFile> = info
                .files
                .iter()
                .filter(|f| has_video_extension(&f.name))
                .filter(|f| match (season, episode) {
                    (Some(s), Some(e)) => seas_ep_filter(s, e, &f.name),
                    _ => true,
                })
                .collect();
            if files.is_empty() {
                bail!("no matching file in usenet transfer");
            }
            files.sort_by(|a, b| b.size.cmp(&a.size));
            self.request_download("/usenet/requestdl", &transfer_id, &files[0].id.to_string())
                .await
        }
        .await;

        if !store_to_cloud {
            let adapter = self.clone_for_cleanup();
            let id = transfer_id.clone();
            tokio::spawn(async move {
                if let Err(e) = adapter.control_transfer("/usenet/controlusenetdownload", &id).await
                {
                    tracing::warn!(id = %id, error = %e, "torbox usenet cleanup failed");
                }
            });
        }
        result
    }

    async fn nzb_status(&self, id: &str) -> Result<NzbStatus> {
        let info = self.transfer_files("/usenet/mylist", id).await?;
        Ok(NzbStatus {
            progress: info.progress,
            eta: info.eta,
            state: info.download_state,
            files: info
                .files
                .into_iter()
                .map(|f| PackFile {
                    filename: f.name,
                    size_bytes: f.size,
                    link: format!("{}:{}", id, f.id),
                    transfer_id: Some(id.to_string()),
                })
                .collect(),
        })
    }
}

impl TorBox {
    fn clone_for_cleanup(&self) -> TorBox {
        TorBox {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            client: self.client.clone(),
        }
    }

    async fn control_transfer(&self, path: &str, id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post_form(path, &[("id", id), ("operation", "delete")])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DebridAdapter for TorBox {
    fn key(&self) -> ProviderKey {
        ProviderKey::Tb
    }

    fn bulk_cache_check(&self) -> Option<&dyn BulkCacheCheck> {
        Some(self)
    }

    fn nzb(&self) -> Option<&dyn NzbResolver> {
        Some(self)
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::DeleteUnlessStored
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let created: CreatedTransfer = self
            .post_form("/torrents/createtorrent", &[("magnet", locator)])
            .await?;
        let transfer_id = created.id.to_string();
        let info = self.transfer_files("/torrents/mylist", &transfer_id).await?;
        Ok(info
            .files
            .into_iter()
            .map(|f| PackFile {
                filename: f.name,
                size_bytes: f.size,
                link: format!("{}:{}", transfer_id, f.id),
                transfer_id: Some(transfer_id.clone()),
            })
            .collect())
    }

    async fn unrestrict(&self, link: &str) -> Result<String> {
        let (transfer_id, file_id) = split_token(link)?;
        self.request_download("/torrents/requestdl", transfer_id, file_id)
            .await
    }

    async fn unrestrict_cloud_item(&self, id: &str, kind: DirectLinkKind) -> Result<String> {
        let (transfer_id, file_id) = split_token(id)?;
        let path = match kind {
            DirectLinkKind::Usenet => "/usenet/requestdl",
            DirectLinkKind::Webdl => "/webdl/requestdl",
            DirectLinkKind::Link => "/torrents/requestdl",
        };
        self.request_download(path, transfer_id, file_id).await
    }

    async fn create_transfer(&self, locator: &str, name: Option<&str>) -> Result<String> {
        let mut form: Vec<(&str, &str)> = vec![("magnet", locator)];
        if let Some(name) = name {
            form.push(("name", name));
        }
        let created: CreatedTransfer = self.post_form("/torrents/createtorrent", &form).await?;
        Ok(created.id.to_string())
    }

    async fn delete_transfer(&self, id: &str) -> Result<()> {
        self.control_transfer("/torrents/controltorrent", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_token() {
        assert_eq!(split_token("12:7").unwrap(), ("12", "7"));
        assert!(split_token("12").is_err());
    }
}
