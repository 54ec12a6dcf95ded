//! Direct-fetch path tests against a local mock HTTP server.

use std::sync::Arc;

use lecture_archiver::resources::{ByteBudget, ResourceCache, ResourceFetcher, ResourceRecord};

fn fetcher_with(budget: ByteBudget) -> (ResourceFetcher, Arc<ResourceCache>) {
    let cache = Arc::new(ResourceCache::new(budget));
    let fetcher = ResourceFetcher::new(Arc::clone(&cache)).unwrap();
    (fetcher, cache)
}

#[tokio::test]
async fn successful_fetch_is_cached_and_hits_network_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/main.css")
        .with_status(200)
        .with_header("content-type", "text/css; charset=utf-8")
        .with_body("body { margin: 0; }")
        .expect(1)
        .create_async()
        .await;

    let (fetcher, cache) = fetcher_with(ByteBudget::default());
    let url = format!("{}/main.css", server.url());

    let first = fetcher.fetch(&url).await.unwrap();
    assert_eq!(first.content_type, "text/css");
    assert_eq!(first.text(), "body { margin: 0; }");

    let second = fetcher.fetch(&url).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.bytes_used(), first.len());
    mock.assert_async().await;
}

#[tokio::test]
async fn fragment_variants_share_one_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/icon.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![1, 2, 3, 4])
        .expect(1)
        .create_async()
        .await;

    let (fetcher, cache) = fetcher_with(ByteBudget::default());
    let base = format!("{}/icon.png", server.url());

    assert!(fetcher.fetch(&format!("{base}#a")).await.is_some());
    assert!(fetcher.fetch(&format!("{base}#b")).await.is_some());
    assert!(fetcher.fetch(&base).await.is_some());
    assert_eq!(cache.bytes_used(), 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn error_and_empty_responses_resolve_to_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing.png")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/empty.css")
        .with_status(200)
        .with_header("content-type", "text/css")
        .with_body("")
        .create_async()
        .await;

    let (fetcher, cache) = fetcher_with(ByteBudget::default());
    assert!(
        fetcher
            .fetch(&format!("{}/missing.png", server.url()))
            .await
            .is_none()
    );
    assert!(
        fetcher
            .fetch(&format!("{}/empty.css", server.url()))
            .await
            .is_none()
    );
    assert_eq!(cache.bytes_used(), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/big.bin")
        .with_status(200)
        .with_body(vec![0u8; 64])
        .create_async()
        .await;

    let (fetcher, cache) = fetcher_with(ByteBudget::new(1024, 32));
    assert!(
        fetcher
            .fetch(&format!("{}/big.bin", server.url()))
            .await
            .is_none()
    );
    assert_eq!(cache.bytes_used(), 0);
}

#[tokio::test]
async fn exhausted_budget_skips_the_network_entirely() {
    let mut server = mockito::Server::new_async().await;
    let untouched = server
        .mock("GET", "/late.png")
        .with_status(200)
        .with_body(vec![9u8; 4])
        .expect(0)
        .create_async()
        .await;

    let (fetcher, cache) = fetcher_with(ByteBudget::new(4, 4));
    cache
        .admit(
            "https://example.com/first.png",
            ResourceRecord::new(vec![1, 2, 3, 4], "image/png"),
        )
        .unwrap();
    assert!(cache.is_budget_exhausted());

    assert!(
        fetcher
            .fetch(&format!("{}/late.png", server.url()))
            .await
            .is_none()
    );
    untouched.assert_async().await;

    // Hits keep working after exhaustion.
    assert!(fetcher.fetch("https://example.com/first.png").await.is_some());
}

#[tokio::test]
async fn data_uris_decode_without_network() {
    let (fetcher, _cache) = fetcher_with(ByteBudget::default());
    let record = fetcher
        .fetch("data:text/plain;base64,aGVsbG8=")
        .await
        .unwrap();
    assert_eq!(record.text(), "hello");
    assert_eq!(record.content_type, "text/plain");
}

#[tokio::test]
async fn non_fetchable_schemes_resolve_to_none() {
    let (fetcher, _cache) = fetcher_with(ByteBudget::default());
    assert!(fetcher.fetch("javascript:void(0)").await.is_none());
    assert!(fetcher.fetch("blob:https://example.com/uuid").await.is_none());
    assert!(fetcher.fetch("mailto:x@example.com").await.is_none());
}

#[tokio::test]
async fn missing_content_type_falls_back_to_extension() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/font.woff2")
        .with_status(200)
        .with_body(vec![0u8; 8])
        .create_async()
        .await;

    let (fetcher, _cache) = fetcher_with(ByteBudget::default());
    let record = fetcher
        .fetch(&format!("{}/font.woff2", server.url()))
        .await
        .unwrap();
    assert_eq!(record.content_type, "font/woff2");
}
