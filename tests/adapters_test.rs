//! Vendor adapter wire-format tests
//!
//! One round trip per vendor against a mock server, covering the parts of
//! each REST dialect the adapters depend on.

use resolvarr::debrid::{AllDebrid, DebridAdapter, EasyDebrid, Offcloud, TorBox};
use resolvarr::models::DirectLinkKind;

const H1: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const H2: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn hashes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// TorBox
// =============================================================================

#[tokio::test]
async fn test_torbox_checkcached_list_format() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/torrents/checkcached")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"success":true,"data":[{{"hash":"{}"}}]}}"#, H1))
        .create_async()
        .await;

    let adapter = TorBox::with_base_url(server.url(), "key");
    let cached = adapter
        .bulk_cache_check()
        .unwrap()
        .check_cache(&hashes(&[H1, H2]))
        .await
        .unwrap();
    assert!(cached.contains(H1));
    assert!(!cached.contains(H2));
}

#[tokio::test]
async fn test_torbox_cloud_item_routes_by_kind() {
    let mut server = mockito::Server::new_async().await;
    let usenet = server
        .mock("GET", "/usenet/requestdl")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success":true,"data":"https://dl.tb/usenet.mkv"}"#)
        .expect(1)
        .create_async()
        .await;

    let adapter = TorBox::with_base_url(server.url(), "key");
    let url = adapter
        .unrestrict_cloud_item("42:7", DirectLinkKind::Usenet)
        .await
        .unwrap();
    assert_eq!(url, "https://dl.tb/usenet.mkv");
    usenet.assert_async().await;
}

// =============================================================================
// EasyDebrid
// =============================================================================

#[tokio::test]
async fn test_easydebrid_lookup_pairs_by_position() {
    let mut server = mockito::Server::new_async().await;
    let lookup = server
        .mock("POST", "/link/lookup")
        .match_body(mockito::Matcher::PartialJsonString(format!(
            r#"{{"urls":["magnet:?xt=urn:btih:{}","magnet:?xt=urn:btih:{}"]}}"#,
            H1, H2
        )))
        .with_status(200)
        .with_body(r#"{"cached":[false,true]}"#)
        .create_async()
        .await;

    let adapter = EasyDebrid::with_base_url(server.url(), "key");
    let cached = adapter
        .bulk_cache_check()
        .unwrap()
        .check_cache(&hashes(&[H1, H2]))
        .await
        .unwrap();
    assert!(!cached.contains(H1));
    assert!(cached.contains(H2));
    lookup.assert_async().await;
}

// =============================================================================
// Offcloud
// =============================================================================

#[tokio::test]
async fn test_offcloud_cache_check() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/cache")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"cachedItems":["{}"]}}"#, H1))
        .create_async()
        .await;

    let adapter = Offcloud::with_base_url(server.url(), "key");
    let cached = adapter
        .bulk_cache_check()
        .unwrap()
        .check_cache(&hashes(&[H1, H2]))
        .await
        .unwrap();
    assert_eq!(cached.len(), 1);
    assert!(cached.contains(H1));
}

#[tokio::test]
async fn test_offcloud_pack_enumeration() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/cloud")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"requestId":"OC1"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/cloud/explore/OC1")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"["https://oc/dl/Some%20Movie.mkv"]"#)
        .create_async()
        .await;

    let adapter = Offcloud::with_base_url(server.url(), "key");
    let files = adapter
        .list_pack_files("magnet:?xt=urn:btih:abc", H1)
        .await
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "Some Movie.mkv");
    assert_eq!(files[0].transfer_id.as_deref(), Some("OC1"));
}

// =============================================================================
// AllDebrid
// =============================================================================

#[tokio::test]
async fn test_alldebrid_unlock() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/link/unlock")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"success","data":{"link":"https://dl.ad/file.mkv"}}"#)
        .create_async()
        .await;

    let adapter = AllDebrid::with_base_url(server.url(), "key");
    let url = adapter.unrestrict("https://ad/locked").await.unwrap();
    assert_eq!(url, "https://dl.ad/file.mkv");
}

#[tokio::test]
async fn test_alldebrid_pack_enumeration() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/magnet/upload")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"success","data":{"magnets":[{"id":77}]}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/magnet/status")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"status":"success","data":{"magnets":{"links":[
                {"link":"https://ad/l1","filename":"Movie.mkv","size":4000}
            ]}}}"#,
        )
        .create_async()
        .await;

    let adapter = AllDebrid::with_base_url(server.url(), "key");
    let files = adapter
        .list_pack_files("magnet:?xt=urn:btih:abc", H1)
        .await
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "Movie.mkv");
    assert_eq!(files[0].transfer_id.as_deref(), Some("77"));
}
