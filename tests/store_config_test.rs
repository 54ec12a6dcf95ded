//! Store configuration environment handling.
//!
//! A single test function: environment mutation is process-global, so the
//! scenarios run sequentially in one body instead of racing in parallel
//! test threads.

use lecture_archiver::config::StoreConfig;
use lecture_archiver::error::ArchiveError;

#[test]
fn store_config_env_scenarios() {
    unsafe {
        std::env::set_var("MINIO_ENDPOINT", "minio.internal:9000");
        std::env::set_var("MINIO_ACCESS_KEY_ID", "archiver");
        std::env::set_var("MINIO_SECRET_ACCESS_KEY", "secret");
        std::env::set_var("MINIO_USE_SSL", "false");
        std::env::remove_var("MINIO_REGION");
        std::env::remove_var("MINIO_BUCKET");
    }

    let config = StoreConfig::from_env().unwrap();
    assert_eq!(config.endpoint_url(), "http://minio.internal:9000");
    assert_eq!(config.region, "us-east-1");
    assert!(config.bucket.is_none());
    assert_eq!(config.bucket_or(Some("override")).unwrap(), "override");
    assert!(matches!(
        config.bucket_or(None),
        Err(ArchiveError::Config(_))
    ));

    unsafe {
        std::env::set_var("MINIO_USE_SSL", "true");
        std::env::set_var("MINIO_REGION", "eu-west-1");
        std::env::set_var("MINIO_BUCKET", "lecture-assets");
    }
    let config = StoreConfig::from_env().unwrap();
    assert_eq!(config.endpoint_url(), "https://minio.internal:9000");
    assert_eq!(config.region, "eu-west-1");
    assert_eq!(config.bucket_or(None).unwrap(), "lecture-assets");

    // An explicit scheme on the endpoint wins over MINIO_USE_SSL.
    unsafe {
        std::env::set_var("MINIO_ENDPOINT", "http://localhost:9000");
    }
    let config = StoreConfig::from_env().unwrap();
    assert_eq!(config.endpoint_url(), "http://localhost:9000");

    unsafe {
        std::env::remove_var("MINIO_ENDPOINT");
    }
    assert!(matches!(
        StoreConfig::from_env(),
        Err(ArchiveError::Config(_))
    ));

    unsafe {
        std::env::set_var("MINIO_ENDPOINT", "minio.internal:9000");
        std::env::remove_var("MINIO_ACCESS_KEY_ID");
    }
    assert!(matches!(
        StoreConfig::from_env(),
        Err(ArchiveError::Config(_))
    ));
}
