//! EasyDebrid adapter
//!
//! Lookup takes full magnet URIs rather than bare hashes and answers with a
//! positional `cached` array. Link generation never creates a vendor-side
//! transfer, so there is nothing to clean up or store.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

use super::{BulkCacheCheck, CleanupStyle, DebridAdapter};
use crate::models::{PackFile, ProviderKey};

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    cached: Vec<bool>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    files: Vec<GeneratedFile>,
}

#[derive(Debug, Deserialize)]
struct GeneratedFile {
    filename: String,
    #[serde(default)]
    size: u64,
    url: String,
}

pub struct EasyDebrid {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl EasyDebrid {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://easydebrid.com/api/v1", api_key)
    }

    /// Custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .with_context(|| format!("easydebrid {} failed", path))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("easydebrid {} returned unexpected JSON", path))
    }
}

#[async_trait]
impl BulkCacheCheck for EasyDebrid {
    async fn check_cache(&self, hashes: &[String]) -> Result<HashSet<String>> {
        let urls: Vec<String> = hashes
            .iter()
            .map(|h| format!("magnet:?xt=urn:btih:{}", h))
            .collect();
        let response: LookupResponse = self
            .post_json("/link/lookup", &json!({ "urls": urls }))
            .await?;

        // flags line up with the submitted order
        Ok(hashes
            .iter()
            .zip(response.cached)
            .filter(|(_, cached)| *cached)
            .map(|(hash, _)| hash.clone())
            .collect())
    }
}

#[async_trait]
impl DebridAdapter for EasyDebrid {
    fn key(&self) -> ProviderKey {
        ProviderKey::Ed
    }

    fn bulk_cache_check(&self) -> Option<&dyn BulkCacheCheck> {
        Some(self)
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::None
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let response: GenerateResponse = self
            .post_json("/link/generate", &json!({ "url": locator }))
            .await?;
        Ok(response
            .files
            .into_iter()
            .map(|f| PackFile {
                filename: f.filename,
                size_bytes: f.size,
                link: f.url,
                transfer_id: None,
            })
            .collect())
    }

    /// Generated URLs are directly fetchable
    async fn unrestrict(&self, link: &str) -> Result<String> {
        Ok(link.to_string())
    }

    async fn create_transfer(&self, _locator: &str, _name: Option<&str>) -> Result<String> {
        bail!("easydebrid has no persistent cloud library")
    }

    async fn delete_transfer(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}
