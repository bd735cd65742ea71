//! Real-Debrid adapter
//!
//! Torrent-only flow: enumerate a pack by adding the magnet, selecting all
//! files and reading the torrent info back; the add is transient and the
//! resolver deletes it unless the user stores resolved torrents. No bulk
//! cache endpoint since the vendor removed instantAvailability; cache status
//! comes from the oracle probes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{CleanupStyle, DebridAdapter};
use crate::models::{PackFile, ProviderKey};

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TorrentInfoFile {
    path: String,
    bytes: u64,
    selected: u8,
}

#[derive(Debug, Deserialize)]
struct TorrentInfoResponse {
    files: Vec<TorrentInfoFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}

pub struct RealDebrid {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RealDebrid {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://api.real-debrid.com/rest/1.0", api_key)
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

    async fn add_magnet(&self, magnet: &str) -> Result<String> {
        let response: AddMagnetResponse = self
            .client
            .post(format!("{}/torrents/addMagnet", self.base_url))
            .header("Authorization", self.bearer())
            .form(&[("magnet", magnet)])
            .send()
            .await
            .context("real-debrid addMagnet failed")?
            .error_for_status()?
            .json()
            .await
            .context("real-debrid addMagnet returned unexpected JSON")?;
        Ok(response.id)
    }

    async fn select_all_files(&self, torrent_id: &str) -> Result<()> {
        self.client
            .post(format!("{}/torrents/selectFiles/{}", self.base_url, torrent_id))
            .header("Authorization", self.bearer())
            .form(&[("files", "all")])
            .send()
            .await
            .context("real-debrid selectFiles failed")?
            .error_for_status()?;
        Ok(())
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfoResponse> {
        self.client
            .get(format!("{}/torrents/info/{}", self.base_url, torrent_id))
            .header("Authorization", self.bearer())
            .send()
            .await
            .context("real-debrid torrent info failed")?
            .error_for_status()?
            .json()
            .await
            .context("real-debrid torrent info returned unexpected JSON")
    }
}

#[async_trait]
impl DebridAdapter for RealDebrid {
    fn key(&self) -> ProviderKey {
        ProviderKey::Rd
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::DeleteUnlessStored
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let torrent_id = self.add_magnet(locator).await?;
        self.select_all_files(&torrent_id).await?;
        let info = self.torrent_info(&torrent_id).await?;

        // selected files line up with the links array by position
        let files = info
            .files
            .into_iter()
            .filter(|f| f.selected == 1)
            .zip(info.links)
            .map(|(f, link)| PackFile {
                filename: f
                    .path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&f.path)
                    .to_string(),
                size_bytes: f.bytes,
                link,
                transfer_id: Some(torrent_id.clone()),
            })
            .collect();
        Ok(files)
    }

    async fn unrestrict(&self, link: &str) -> Result<String> {
        let response: UnrestrictResponse = self
            .client
            .post(format!("{}/unrestrict/link", self.base_url))
            .header("Authorization", self.bearer())
            .form(&[("link", link)])
            .send()
            .await
            .context("real-debrid unrestrict failed")?
            .error_for_status()?
            .json()
            .await
            .context("real-debrid unrestrict returned unexpected JSON")?;
        Ok(response.download)
    }

    async fn create_transfer(&self, locator: &str, _name: Option<&str>) -> Result<String> {
        let torrent_id = self.add_magnet(locator).await?;
        self.select_all_files(&torrent_id).await?;
        Ok(torrent_id)
    }

    async fn delete_transfer(&self, id: &str) -> Result<()> {
        self.client
            .delete(format!("{}/torrents/delete/{}", self.base_url, id))
            .header("Authorization", self.bearer())
            .send()
            .await
            .context("real-debrid delete failed")?
            .error_for_status()?;
        Ok(())
    }
}
