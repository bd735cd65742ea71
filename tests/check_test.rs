//! Cache-check orchestration tests
//!
//! End-to-end over the check session: oracle probing, bulk endpoints,
//! write-back and idempotence, all against mock HTTP servers.

use std::sync::Arc;
use std::time::Duration;

use resolvarr::config::{BatchPolicy, OracleConfig};
use resolvarr::debrid::{DebridAdapter, Premiumize};
use resolvarr::models::ProviderKey;
use resolvarr::sources::CacheCheckSession;
use resolvarr::HashCacheStore;

const H1: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const H2: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const H3: &str = "cccccccccccccccccccccccccccccccccccccccc";

fn hashes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn oracles_at(url: &str) -> OracleConfig {
    OracleConfig {
        mediafusion_url: url.to_string(),
        mediafusion_key: String::new(),
        torz_url: url.to_string(),
        torz_key: String::new(),
        torrentio_url: url.to_string(),
        torrentio_key: String::new(),
        dmm_url: url.to_string(),
        probe_timeout_ms: 2000,
    }
}

// =============================================================================
// Oracle Path
// =============================================================================

/// A hash counted cached by either oracle counts cached overall
#[tokio::test]
async fn test_oracle_union() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/stream/movie/tt0133093.json")
        .with_status(200)
        .with_body(format!(
            r#"{{"streams":[{{"name":"[RD+] 2160p","url":"https://t/{}/0"}}]}}"#,
            H1
        ))
        .create_async()
        .await;
    server
        .mock("POST", "/api/availability/check")
        .with_status(200)
        .with_body(format!(r#"{{"available":[{{"hash":"{}"}}]}}"#, H2))
        .create_async()
        .await;

    let store = Arc::new(HashCacheStore::in_memory(Duration::from_secs(3600)));
    let session = CacheCheckSession::new(
        ProviderKey::Rd,
        "tt0133093",
        None,
        None,
        store,
        oracles_at(&server.url()),
        BatchPolicy::Sample,
    );

    let mut cached = session.check_cache(&hashes(&[H1, H2, H3]), None).await;
    cached.sort();
    assert_eq!(cached, hashes(&[H1, H2]));
}

/// The second check for the same hashes is served entirely from the
/// local cache: the oracles are contacted exactly once
#[tokio::test]
async fn test_second_check_is_idempotent() {
    let mut server = mockito::Server::new_async().await;
    let addon = server
        .mock("GET", "/stream/movie/tt0133093.json")
        .with_status(200)
        .with_body(format!(
            r#"{{"streams":[{{"name":"[RD+] 1080p","url":"https://t/{}/0"}}]}}"#,
            H1
        ))
        .expect(1)
        .create_async()
        .await;
    let dmm = server
        .mock("POST", "/api/availability/check")
        .with_status(200)
        .with_body(r#"{"available":[]}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(HashCacheStore::in_memory(Duration::from_secs(3600)));
    let session = CacheCheckSession::new(
        ProviderKey::Rd,
        "tt0133093",
        None,
        None,
        store,
        oracles_at(&server.url()),
        BatchPolicy::Sample,
    );

    let first = session.check_cache(&hashes(&[H1]), None).await;
    assert_eq!(first, hashes(&[H1]));

    // let the spawned write-back land before asking again
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = session.check_cache(&hashes(&[H1]), None).await;
    assert_eq!(second, hashes(&[H1]));
    addon.assert_async().await;
    dmm.assert_async().await;
}

/// An oracle returning garbage is treated as answering nothing
#[tokio::test]
async fn test_garbage_oracle_response_is_ignored() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/stream/movie/tt0133093.json")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;
    server
        .mock("POST", "/api/availability/check")
        .with_status(200)
        .with_body(format!(r#"{{"available":[{{"hash":"{}"}}]}}"#, H1))
        .create_async()
        .await;

    let store = Arc::new(HashCacheStore::in_memory(Duration::from_secs(3600)));
    let session = CacheCheckSession::new(
        ProviderKey::Rd,
        "tt0133093",
        None,
        None,
        store,
        oracles_at(&server.url()),
        BatchPolicy::Sample,
    );

    let cached = session.check_cache(&hashes(&[H1, H2]), None).await;
    assert_eq!(cached, hashes(&[H1]));
}

// =============================================================================
// Bulk Path
// =============================================================================

/// Full round through a vendor bulk endpoint, positional flag pairing
/// included
#[tokio::test]
async fn test_bulk_endpoint_round_trip() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/cache/check")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"response":[true,false]}"#)
        .create_async()
        .await;

    let adapter = Premiumize::with_base_url(server.url(), "key");
    let store = Arc::new(HashCacheStore::in_memory(Duration::from_secs(3600)));
    let session = CacheCheckSession::new(
        ProviderKey::Pm,
        "tt0133093",
        None,
        None,
        store.clone(),
        oracles_at("http://127.0.0.1:1"),
        BatchPolicy::Sample,
    );

    let cached = session
        .check_cache(&hashes(&[H1, H2]), adapter.bulk_cache_check())
        .await;
    assert_eq!(cached, hashes(&[H1]));

    // positive written back, negative left absent
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.get_many(&hashes(&[H1])).len(), 1);
    assert!(store.get_many(&hashes(&[H2])).is_empty());
}

/// A dead bulk endpoint yields an empty verdict, not an error
#[tokio::test]
async fn test_bulk_endpoint_failure_is_empty() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/cache/check")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let adapter = Premiumize::with_base_url(server.url(), "key");
    let store = Arc::new(HashCacheStore::in_memory(Duration::from_secs(3600)));
    let session = CacheCheckSession::new(
        ProviderKey::Pm,
        "tt0133093",
        None,
        None,
        store,
        oracles_at("http://127.0.0.1:1"),
        BatchPolicy::Sample,
    );

    let cached = session
        .check_cache(&hashes(&[H1]), adapter.bulk_cache_check())
        .await;
    assert!(cached.is_empty());
}
