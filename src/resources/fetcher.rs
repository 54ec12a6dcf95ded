use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use log::{debug, warn};

use super::cache::ResourceCache;
use super::types::ResourceRecord;
use super::Resolver;
use crate::utils::constants::{ARCHIVER_USER_AGENT, RESOURCE_FETCH_TIMEOUT_SECS};
use crate::utils::url_utils::{guess_content_type_by_ext, normalize_content_type};

/// Direct HTTP fetch path for resources the browser capture missed.
///
/// Every failure mode (bad scheme, transport error, non-2xx status, empty
/// or oversized body, exhausted budget) resolves to `None`. The document is
/// degraded locally; a run never aborts because one sub-resource is gone.
pub struct ResourceFetcher {
    client: reqwest::Client,
    cache: Arc<ResourceCache>,
}

impl ResourceFetcher {
    pub fn new(cache: Arc<ResourceCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RESOURCE_FETCH_TIMEOUT_SECS))
            .user_agent(ARCHIVER_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, cache })
    }

    /// Fetch an absolute URL through the cache.
    ///
    /// `data:` URIs are decoded in place and cached like any other body so
    /// already-inlined content flows through unchanged.
    pub async fn fetch(&self, url: &str) -> Option<Arc<ResourceRecord>> {
        if let Some(hit) = self.cache.get(url) {
            return Some(hit);
        }

        if url.starts_with("data:") {
            let record = ResourceRecord::from_data_uri(url)?;
            return self.cache.admit(url, record);
        }
        if url.starts_with("blob:")
            || url.starts_with("javascript:")
            || url.starts_with("mailto:")
            || url.starts_with("tel:")
            || url.starts_with('#')
        {
            return None;
        }

        if self.cache.is_budget_exhausted() {
            debug!("embed budget exhausted, skipping fetch of {url}");
            return None;
        }

        match self.download(url).await {
            Ok(Some(record)) => self.cache.admit(url, record),
            Ok(None) => None,
            Err(err) => {
                warn!("fetch failed for {url}: {err:#}");
                None
            }
        }
    }

    /// Stream the body with a size check before accumulation, so a huge
    /// response is abandoned as soon as it crosses the per-resource cap.
    async fn download(&self, url: &str) -> Result<Option<ResourceRecord>> {
        let response = self
            .client
            .get(url)
            .header("Accept", "*/*")
            .send()
            .await
            .context("Request failed")?;

        let status = response.status();
        if !status.is_success() {
            debug!("skipping {url}: HTTP {status}");
            return Ok(None);
        }

        let max_single = self.cache.max_single_bytes();
        if let Some(declared) = response.content_length() {
            if declared as usize > max_single {
                debug!("skipping {url}: declared {declared} bytes exceeds per-resource cap");
                return Ok(None);
            }
        }

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(normalize_content_type);

        let mut body: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Body stream error")?;
            if body.len() + chunk.len() > max_single {
                debug!("skipping {url}: body exceeds per-resource cap");
                return Ok(None);
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            debug!("skipping {url}: empty body");
            return Ok(None);
        }

        let content_type =
            header_type.unwrap_or_else(|| guess_content_type_by_ext(url).to_string());
        Ok(Some(ResourceRecord::new(body, content_type)))
    }
}

/// The resolver handed to the sanitizer and CSS inliner for a real run:
/// cache lookup first, direct fetch on miss.
pub struct RunResolver {
    fetcher: ResourceFetcher,
}

impl RunResolver {
    pub fn new(cache: Arc<ResourceCache>) -> Result<Self> {
        Ok(Self {
            fetcher: ResourceFetcher::new(cache)?,
        })
    }
}

impl Resolver for RunResolver {
    async fn resolve(&self, url: &str) -> Option<Arc<ResourceRecord>> {
        self.fetcher.fetch(url).await
    }
}
