//! Run configuration.
//!
//! [`ArchiveConfig`] carries the per-run tunables with defaults from
//! `utils::constants`; [`StoreConfig`] is read from the `MINIO_*`
//! environment and fails fast before any capture work starts.

use crate::error::ArchiveError;
use crate::utils::constants::{
    DEFAULT_MAX_IMPORT_DEPTH, FALLBACK_SETTLE_MS, MAX_SINGLE_EMBED_BYTES, MAX_TOTAL_EMBED_BYTES,
    NAVIGATION_TIMEOUT_SECS, POST_SCROLL_SETTLE_MS, QUIESCENCE_TIMEOUT_SECS, SCROLL_PAUSE_MS,
    SCROLL_STEPS, SCROLL_STEP_PX, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};

/// Tunables for one archival run.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub max_total_embed_bytes: usize,
    pub max_single_embed_bytes: usize,
    pub navigation_timeout_secs: u64,
    pub quiescence_timeout_secs: u64,
    pub fallback_settle_ms: u64,
    pub max_import_depth: usize,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub scroll_steps: u32,
    pub scroll_step_px: u32,
    pub scroll_pause_ms: u64,
    pub post_scroll_settle_ms: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_total_embed_bytes: MAX_TOTAL_EMBED_BYTES,
            max_single_embed_bytes: MAX_SINGLE_EMBED_BYTES,
            navigation_timeout_secs: NAVIGATION_TIMEOUT_SECS,
            quiescence_timeout_secs: QUIESCENCE_TIMEOUT_SECS,
            fallback_settle_ms: FALLBACK_SETTLE_MS,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            scroll_steps: SCROLL_STEPS,
            scroll_step_px: SCROLL_STEP_PX,
            scroll_pause_ms: SCROLL_PAUSE_MS,
            post_scroll_settle_ms: POST_SCROLL_SETTLE_MS,
        }
    }
}

impl ArchiveConfig {
    #[must_use]
    pub fn with_byte_budget(mut self, max_total: usize, max_single: usize) -> Self {
        self.max_total_embed_bytes = max_total;
        self.max_single_embed_bytes = max_single;
        self
    }

    #[must_use]
    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    #[must_use]
    pub fn with_navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }
}

/// Object-store connection settings, MinIO-flavored.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub endpoint: String,
    pub use_ssl: bool,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: Option<String>,
}

fn required_env(name: &str) -> Result<String, ArchiveError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ArchiveError::Config(format!(
            "{name} environment variable is required"
        ))),
    }
}

impl StoreConfig {
    /// Read the store configuration from `MINIO_*` environment variables.
    ///
    /// `MINIO_ENDPOINT`, `MINIO_ACCESS_KEY_ID` and `MINIO_SECRET_ACCESS_KEY`
    /// are required. `MINIO_USE_SSL` defaults to true and only matters when
    /// the endpoint lacks an explicit scheme. `MINIO_BUCKET` may be left
    /// unset when the caller supplies a bucket some other way.
    pub fn from_env() -> Result<Self, ArchiveError> {
        let endpoint = required_env("MINIO_ENDPOINT")?;
        let access_key_id = required_env("MINIO_ACCESS_KEY_ID")?;
        let secret_access_key = required_env("MINIO_SECRET_ACCESS_KEY")?;
        let use_ssl = std::env::var("MINIO_USE_SSL")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        let region = std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let bucket = std::env::var("MINIO_BUCKET")
            .ok()
            .filter(|b| !b.trim().is_empty());

        Ok(Self {
            endpoint,
            use_ssl,
            access_key_id,
            secret_access_key,
            region,
            bucket,
        })
    }

    /// Full endpoint URL, adding a scheme when the configured endpoint has
    /// none.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else if self.use_ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    /// The bucket to use, preferring an explicit override from the caller.
    pub fn bucket_or(&self, override_bucket: Option<&str>) -> Result<String, ArchiveError> {
        override_bucket
            .map(str::to_string)
            .or_else(|| self.bucket.clone())
            .ok_or_else(|| {
                ArchiveError::Config(
                    "No bucket configured: set MINIO_BUCKET or pass --bucket".to_string(),
                )
            })
    }
}
