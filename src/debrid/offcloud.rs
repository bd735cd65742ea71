//! Offcloud adapter
//!
//! Auth is a `key` query parameter on every call. Pack enumeration creates a
//! cloud request and explores it; explore links are already fetchable, so
//! unrestrict is a passthrough. Exposes the `/cache` bulk endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

use super::{BulkCacheCheck, CleanupStyle, DebridAdapter};
use crate::models::{PackFile, ProviderKey};

#[derive(Debug, Deserialize)]
struct CacheResponse {
    #[serde(rename = "cachedItems", default)]
    cached_items: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CloudResponse {
    #[serde(rename = "requestId")]
    request_id: String,
}

pub struct Offcloud {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl Offcloud {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://offcloud.com/api", api_key)
    }

    /// Custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn explore(&self, request_id: &str) -> Result<Vec<String>> {
        self.client
            .get(format!("{}/cloud/explore/{}", self.base_url, request_id))
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .context("offcloud explore failed")?
            .error_for_status()?
            .json()
            .await
            .context("offcloud explore returned unexpected JSON")
    }
}

#[async_trait]
impl BulkCacheCheck for Offcloud {
    async fn check_cache(&self, hashes: &[String]) -> Result<HashSet<String>> {
        let response: CacheResponse = self
            .client
            .post(format!("{}/cache", self.base_url))
            .query(&[("key", &self.api_key)])
            .json(&json!({ "hashes": hashes }))
            .send()
            .await
            .context("offcloud cache check failed")?
            .error_for_status()?
            .json()
            .await
            .context("offcloud cache check returned unexpected JSON")?;
        Ok(response.cached_items.into_iter().collect())
    }
}

#[async_trait]
impl DebridAdapter for Offcloud {
    fn key(&self) -> ProviderKey {
        ProviderKey::Oc
    }

    fn bulk_cache_check(&self) -> Option<&dyn BulkCacheCheck> {
        Some(self)
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::DeleteUnlessStored
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let response: CloudResponse = self
            .client
            .post(format!("{}/cloud", self.base_url))
            .query(&[("key", &self.api_key)])
            .json(&json!({ "url": locator }))
            .send()
            .await
            .context("offcloud cloud request failed")?
            .error_for_status()?
            .json()
            .await
            .context("offcloud cloud request returned unexpected JSON")?;

        let links = self.explore(&response.request_id).await?;
        Ok(links
            .into_iter()
            .map(|link| PackFile {
                filename: link
                    .rsplit('/')
                    .next()
                    .map(|n| urlencoding::decode(n).map(|d| d.into_owned()).unwrap_or_else(|_| n.to_string()))
                    .unwrap_or_default(),
                // explore reports no sizes
                size_bytes: 0,
                link,
                transfer_id: Some(response.request_id.clone()),
            })
            .collect())
    }

    /// Explore links are directly fetchable
    async fn unrestrict(&self, link: &str) -> Result<String> {
        Ok(link.to_string())
    }

    async fn create_transfer(&self, locator: &str, _name: Option<&str>) -> Result<String> {
        let response: CloudResponse = self
            .client
            .post(format!("{}/cloud", self.base_url))
            .query(&[("key", &self.api_key)])
            .json(&json!({ "url": locator }))
            .send()
            .await
            .context("offcloud cloud request failed")?
            .error_for_status()?
            .json()
            .await
            .context("offcloud cloud request returned unexpected JSON")?;
        Ok(response.request_id)
    }

    async fn delete_transfer(&self, id: &str) -> Result<()> {
        self.client
            .get(format!("{}/cloud/remove/{}", self.base_url, id))
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .context("offcloud remove failed")?
            .error_for_status()?;
        Ok(())
    }
}
