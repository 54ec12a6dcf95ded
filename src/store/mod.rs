//! S3-compatible object store upload.
//!
//! Snapshots go into a MinIO-style bucket with path-style addressing and
//! carry provenance metadata so a stored object can always be traced back
//! to its source page and verified against its digest.

pub mod keys;

pub use keys::{default_object_key_for_url, sanitize_segment, utc_version_stamp};

use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sha2::{Digest, Sha256};

use crate::config::StoreConfig;

/// Hex-encoded SHA-256 digest of a payload.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Provenance attached to every stored snapshot.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_url: String,
    pub sha256_hex: String,
    pub captured_at: DateTime<Utc>,
}

/// Client for the snapshot bucket.
pub struct ArchiveStore {
    client: Client,
}

impl ArchiveStore {
    /// Build a client from the store configuration.
    ///
    /// Path-style addressing is required for MinIO; virtual-hosted style
    /// would try to resolve the bucket as a DNS label on the endpoint.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "lecture-archiver",
        );
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Upload one snapshot. Succeeds atomically or fails; there is no
    /// partial-object state to clean up.
    pub async fn put_snapshot(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        provenance: &Provenance,
    ) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .metadata("x-lecture-source-url", &provenance.source_url)
            .metadata("x-lecture-sha256", &provenance.sha256_hex)
            .metadata(
                "x-lecture-captured-at",
                provenance
                    .captured_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{bucket}/{key}"))?;

        info!("uploaded {size} bytes to s3://{bucket}/{key}");
        Ok(())
    }
}
