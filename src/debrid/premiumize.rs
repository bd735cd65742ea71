//! Premiumize adapter
//!
//! Pack enumeration goes through `transfer/directdl`, which hands back
//! directly fetchable links without creating a transfer, so there is nothing
//! to delete afterwards. The inverse applies: when the user wants the item
//! kept, the resolver re-adds it to the cloud library with `create_transfer`.
//! Exposes the `cache/check` bulk endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;

use super::{BulkCacheCheck, CleanupStyle, DebridAdapter};
use crate::models::{DirectLinkKind, PackFile, ProviderKey};

#[derive(Debug, Deserialize)]
struct DirectDlResponse {
    #[serde(default)]
    content: Vec<DirectDlFile>,
}

#[derive(Debug, Deserialize)]
struct DirectDlFile {
    path: String,
    size: u64,
    link: String,
}

#[derive(Debug, Deserialize)]
struct CacheCheckResponse {
    response: Vec<bool>,
}

#[derive(Debug, Deserialize)]
struct TransferCreateResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ItemDetailsResponse {
    link: String,
}

pub struct Premiumize {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl Premiumize {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url("https://www.premiumize.me/api", api_key)
    }

    /// Custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BulkCacheCheck for Premiumize {
    async fn check_cache(&self, hashes: &[String]) -> Result<HashSet<String>> {
        let mut query: Vec<(&str, &str)> = vec![("apikey", &self.api_key)];
        for hash in hashes {
            query.push(("items[]", hash));
        }
        let response: CacheCheckResponse = self
            .client
            .get(format!("{}/cache/check", self.base_url))
            .query(&query)
            .send()
            .await
            .context("premiumize cache check failed")?
            .error_for_status()?
            .json()
            .await
            .context("premiumize cache check returned unexpected JSON")?;

        // response flags line up with the submitted order
        Ok(hashes
            .iter()
            .zip(response.response)
            .filter(|(_, cached)| *cached)
            .map(|(hash, _)| hash.clone())
            .collect())
    }
}

#[async_trait]
impl DebridAdapter for Premiumize {
    fn key(&self) -> ProviderKey {
        ProviderKey::Pm
    }

    fn bulk_cache_check(&self) -> Option<&dyn BulkCacheCheck> {
        Some(self)
    }

    fn cleanup_style(&self) -> CleanupStyle {
        CleanupStyle::StoreWhenRequested
    }

    async fn list_pack_files(&self, locator: &str, _hash: &str) -> Result<Vec<PackFile>> {
        let response: DirectDlResponse = self
            .client
            .post(format!("{}/transfer/directdl", self.base_url))
            .query(&[("apikey", &self.api_key)])
            .form(&[("src", locator)])
            .send()
            .await
            .context("premiumize directdl failed")?
            .error_for_status()?
            .json()
            .await
            .context("premiumize directdl returned unexpected JSON")?;

        Ok(response
            .content
            .into_iter()
            .map(|f| PackFile {
                filename: f.path.rsplit('/').next().unwrap_or(&f.path).to_string(),
                size_bytes: f.size,
                link: f.link,
                // directdl creates no vendor-side transfer
                transfer_id: None,
            })
            .collect())
    }

    /// Premiumize links from directdl are already fetchable; normalize
    /// scheme-relative forms and pass everything else through.
    async fn unrestrict(&self, link: &str) -> Result<String> {
        if link.starts_with("//") {
            return Ok(format!("https:{}", link));
        }
        if link.starts_with('/') {
            return Ok(format!("https:{}", link));
        }
        Ok(link.to_string())
    }

    async fn unrestrict_cloud_item(&self, id: &str, _kind: DirectLinkKind) -> Result<String> {
        let response: ItemDetailsResponse = self
            .client
            .get(format!("{}/item/details", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("id", id)])
            .send()
            .await
            .context("premiumize item details failed")?
            .error_for_status()?
            .json()
            .await
            .context("premiumize item details returned unexpected JSON")?;
        self.unrestrict(&response.link).await
    }

    async fn create_transfer(&self, locator: &str, _name: Option<&str>) -> Result<String> {
        let response: TransferCreateResponse = self
            .client
            .post(format!("{}/transfer/create", self.base_url))
            .query(&[("apikey", &self.api_key)])
            .form(&[("src", locator)])
            .send()
            .await
            .context("premiumize transfer create failed")?
            .error_for_status()?
            .json()
            .await
            .context("premiumize transfer create returned unexpected JSON")?;
        Ok(response.id)
    }

    async fn delete_transfer(&self, id: &str) -> Result<()> {
        self.client
            .post(format!("{}/transfer/delete", self.base_url))
            .query(&[("apikey", &self.api_key)])
            .form(&[("id", id)])
            .send()
            .await
            .context("premiumize transfer delete failed")?
            .error_for_status()?;
        Ok(())
    }
}
