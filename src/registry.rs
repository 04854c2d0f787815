//! npm registry client and metadata document types.
//!
//! The registry's package document is fetched fresh per request: dist-tags
//! move between requests, so nothing here is cached.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

use crate::config::RegistryConfig;
use crate::error::ClientError;
use crate::tarcache::TarballFetcher;

const UA: &str = concat!("tinydelivr/", env!("CARGO_PKG_VERSION"));

/// The registry's package document, trimmed to the fields the gateway
/// reads. `BTreeMap` keeps iteration deterministic.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryDocument {
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    pub dist: DistInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistInfo {
    pub tarball: String,
}

/// Upstream HTTP client for registry metadata and tarball downloads.
pub struct RegistryClient {
    http: reqwest::Client,
    base: Url,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(UA)
            .build()
            .context("building registry http client")?;
        Ok(Self {
            http,
            base: config.url.clone(),
        })
    }

    /// Fetch a package's metadata document. A 404 from the registry is a
    /// client fault ("package not found"); any other non-success status is
    /// a server fault.
    pub async fn fetch_metadata(&self, package_name: &str) -> Result<RegistryDocument> {
        let url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            package_name
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting registry metadata from {url}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::not_found(format!("package {package_name} not found")).into());
        }
        let response = response
            .error_for_status()
            .with_context(|| format!("registry returned an error status for {package_name}"))?;

        response
            .json::<RegistryDocument>()
            .await
            .with_context(|| format!("decoding registry metadata for {package_name}"))
    }
}

#[async_trait]
impl TarballFetcher for RegistryClient {
    async fn fetch_tarball(&self, url: &str) -> Result<Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting tarball {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("tarball fetch returned an error status for {url}"))?;
        response
            .bytes()
            .await
            .with_context(|| format!("reading tarball body from {url}"))
    }
}
