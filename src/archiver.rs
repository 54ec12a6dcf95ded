//! End-to-end archival runs.
//!
//! One run is: launch a browser, capture the page (streaming its
//! sub-resources into a fresh budget-guarded cache), then either sanitize
//! and inline into self-contained HTML or print to PDF. The outcome carries
//! the payload and its provenance; uploading it is the caller's step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use crate::capture::CaptureDriver;
use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::resources::{ByteBudget, ResourceCache, RunResolver};
use crate::sanitizer::sanitize_document;
use crate::store::sha256_hex;

/// The product of one archival run, ready for upload.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub sha256_hex: String,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

fn run_cache(config: &ArchiveConfig) -> Arc<ResourceCache> {
    Arc::new(ResourceCache::new(ByteBudget::new(
        config.max_total_embed_bytes,
        config.max_single_embed_bytes,
    )))
}

/// Capture `url` and produce a self-contained HTML snapshot.
pub async fn archive_url_to_html(url: &str, config: &ArchiveConfig) -> Result<ArchiveOutcome> {
    let cache = run_cache(config);
    let driver = CaptureDriver::launch(config)
        .await
        .map_err(|e| ArchiveError::Browser(format!("{e:#}")))?;

    let captured_at = Utc::now();
    let raw_html = driver
        .capture_html(url, config, &cache)
        .await
        .map_err(|e| ArchiveError::Navigation(format!("{e:#}")))?;
    driver.close().await;
    info!(
        "captured {} bytes of raw HTML, {} resource bytes cached",
        raw_html.len(),
        cache.bytes_used()
    );

    let resolver = RunResolver::new(Arc::clone(&cache))?;
    let html = sanitize_document(
        &raw_html,
        url,
        captured_at,
        config.max_import_depth,
        &resolver,
    )
    .await
    .map_err(|e| ArchiveError::Parse(format!("{e:#}")))?;

    let bytes = html.into_bytes();
    let sha256_hex = sha256_hex(&bytes);
    Ok(ArchiveOutcome {
        bytes,
        content_type: "text/html; charset=utf-8".to_string(),
        sha256_hex,
        source_url: url.to_string(),
        captured_at,
    })
}

/// Capture `url` and print it to a PDF snapshot.
pub async fn archive_url_to_pdf(url: &str, config: &ArchiveConfig) -> Result<ArchiveOutcome> {
    let driver = CaptureDriver::launch(config)
        .await
        .map_err(|e| ArchiveError::Browser(format!("{e:#}")))?;

    let captured_at = Utc::now();
    let bytes = driver
        .capture_pdf(url, config)
        .await
        .map_err(|e| ArchiveError::Navigation(format!("{e:#}")))?;
    driver.close().await;
    info!("printed {} bytes of PDF", bytes.len());

    let sha256_hex = sha256_hex(&bytes);
    Ok(ArchiveOutcome {
        bytes,
        content_type: "application/pdf".to_string(),
        sha256_hex,
        source_url: url.to_string(),
        captured_at,
    })
}
