//! AllDebrid adapter
//!
//! Uses the v4 API with apikey query auth. Magnet uploads are transient; the
//! resolver deletes them unless resolved torrents are stored. Cache status
//! comes from the oracle probes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{CleanupStyle, DebridAdapter};
use crate::models::{PackFile, ProviderKey};

const AGENT: &str = "resolvarr";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    magnets: Vec<UploadedMagnet>,
}

#[derive(Debug, Deserialize)]
struct UploadedMagnet {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    magnets: MagnetStatus,
}

#[derive(Debug, Deserialize)]
struct MagnetStatus {
    #[serde(default)]
    links: Vec<MagnetLink>,
}

#[derive(Debug, Deserialize)]
struct MagnetLink {
    link: String,
    filename: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct UnlockData {
    link: String,
}

pub struct AllDebrid {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AllDebrid {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://api.alldebrid.com/v4", api_key)
    }

    /// Custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut query: Vec<(&str, &str)> = vec![("agent", AGENT), ("apikey", &self.api_key)];
        query.extend_from_slice(params);
        let envelope: Envelope<T> = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("alldebrid {} failed", path))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("alldebrid {} returned unexpected JSON", path))?;
        Ok(envelope.data)
    }

    async fn upload_magnet(&self, magnet: &str) -> Result<String> {
        let data: UploadData = self
            .get_json("/magnet/upload", &[("magnets[]", magnet)])
            .await?;
        let magnet = data
            .magnets
            .into_iter()
            .next()
            .context("alldebrid upload returned no magnet")?;
        Ok(magnet.id.to_string())
    }
}

#[async_trait]
impl DebridAdapter for AllDebrid {
    fn key(&self) -> ProviderKey {
        ProviderKey::Ad
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::DeleteUnlessStored
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let magnet_id = self.upload_magnet(locator).await?;
        let data: StatusData = self.get_json("/magnet/status", &[("id", &magnet_id)]).await?;
        Ok(data
            .magnets
            .links
            .into_iter()
            .map(|l| PackFile {
                filename: l.filename,
                size_bytes: l.size,
                link: l.link,
                transfer_id: Some(magnet_id.clone()),
            })
            .collect())
    }

    async fn unrestrict(&self, link: &str) -> Result<String> {
        let data: UnlockData = self.get_json("/link/unlock", &[("link", link)]).await?;
        Ok(data.link)
    }

    async fn create_transfer(&self, locator: &str, _name: Option<&str>) -> Result<String> {
        self.upload_magnet(locator).await
    }

    async fn delete_transfer(&self, id: &str) -> Result<()> {
        let _: serde_json::Value = self.get_json("/magnet/delete", &[("id", id)]).await?;
        Ok(())
    }
}
