#![allow(clippy::unwrap_used)]
// Integration tests for `LocalClient` endpoint discovery using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unipresence_api::{Endpoint, Error, LocalClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LocalClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = LocalClient::with_client(reqwest::Client::new(), base_url, "default".into());
    (server, client)
}

fn not_found(p: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_fourth_candidate_is_discovered_and_remembered() {
    let (server, client) = setup().await;

    for p in [
        "/proxy/network/v2/api/site/default/clients/active",
        "/proxy/network/api/s/default/stat/sta",
        "/proxy/network/api/s/default/stat/alluser",
    ] {
        not_found(p).expect(1).mount(&server).await;
    }

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "mac": "aa:bb:cc:dd:ee:ff", "ap_mac": "11:22:33:44:55:66" }
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.list_active_clients().await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
    assert_eq!(first[0].ap_mac.as_deref(), Some("11:22:33:44:55:66"));

    assert_eq!(
        client.profile().clients,
        Some(Endpoint {
            prefix: "/proxy/network",
            path: "api/stat/sta",
        })
    );
    assert_eq!(client.profile().prefix, Some("/proxy/network"));

    // Second cycle goes straight to the remembered endpoint; the mocks'
    // `expect` counts verify the first three are not retried.
    let second = client.list_active_clients().await;
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_data_envelope_is_unwrapped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/v2/api/site/default/clients/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [
                { "mac": "aa:bb:cc:dd:ee:01", "display_name": "Phone" },
                { "mac": "aa:bb:cc:dd:ee:02", "hostname": "laptop", "ip": "10.0.0.7" }
            ]
        })))
        .mount(&server)
        .await;

    let clients = client.list_active_clients().await;
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].display_name.as_deref(), Some("Phone"));
    assert_eq!(clients[1].ip.as_deref(), Some("10.0.0.7"));
}

#[tokio::test]
async fn test_html_and_error_envelopes_are_skipped() {
    let (server, client) = setup().await;

    // Gateway consoles answer unknown paths with their web UI.
    Mock::given(method("GET"))
        .and(path("/proxy/network/v2/api/site/default/clients/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!DOCTYPE html><html></html>"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "api.err.NoSiteContext" },
            "data": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/proxy/network/api/s/default/stat/alluser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [{ "mac": "aa:bb:cc:dd:ee:ff" }]
        })))
        .mount(&server)
        .await;

    let clients = client.try_list_active_clients().await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(
        client.profile().clients.map(|e| e.path),
        Some("api/s/{site}/stat/alluser")
    );
}

#[tokio::test]
async fn test_all_candidates_failing_degrades_to_empty() {
    let (_server, client) = setup().await;

    let result = client.try_list_active_clients().await;
    assert!(
        matches!(result, Err(Error::NoEndpoint { .. })),
        "expected NoEndpoint, got: {result:?}"
    );

    assert!(client.list_active_clients().await.is_empty());
    assert!(client.list_access_points().await.is_empty());
    assert_eq!(client.profile(), unipresence_api::BackendProfile::default());
}

#[tokio::test]
async fn test_failed_remembered_endpoint_is_forgotten() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    assert!(client.try_list_active_clients().await.is_ok());
    assert_eq!(client.profile().prefix, Some(""));

    // Controller moved the endpoint; the remembered one now 404s.
    let result = client.try_list_active_clients().await;
    assert!(matches!(result, Err(Error::Http { status: 404, .. })));
    assert_eq!(client.profile().clients, None);
}

#[tokio::test]
async fn test_device_discovery_prefers_known_prefix() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "mac": "11:22:33:44:55:66", "type": "uap", "name": "Living Room AP" }]
        })))
        .mount(&server)
        .await;

    client.try_list_active_clients().await.unwrap();
    let devices = client.try_list_access_points().await.unwrap();
    assert_eq!(devices[0].name.as_deref(), Some("Living Room AP"));

    // Only the remembered prefix was consulted for devices.
    let requests = server.received_requests().await.unwrap();
    let device_requests = requests
        .iter()
        .filter(|r| r.url.path().contains("device"))
        .count();
    assert_eq!(device_requests, 1);
}

// ── Traffic ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_short_window_traffic_sums_buckets() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/proxy/network/api/s/default/stat/report/5minutes.user"))
        .and(body_partial_json(json!({ "macs": ["aa:bb:cc:dd:ee:ff"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [
                { "rx_bytes": 30000.0, "tx_bytes": 2000.0, "time": 1 },
                { "rx_bytes": 10000.0, "tx_bytes": 10000.0, "time": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let sample = client.short_window_traffic("AA:BB:CC:DD:EE:FF").await.unwrap();
    assert_eq!(sample.rx, 40000);
    assert_eq!(sample.tx, 12000);
}

#[tokio::test]
async fn test_short_window_traffic_unavailable() {
    let (_server, client) = setup().await;
    assert_eq!(client.short_window_traffic("aa:bb:cc:dd:ee:ff").await, None);
}

// ── Probe ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_falls_back_to_raw_client_list() {
    let (server, client) = setup().await;

    // Typed decoding rejects this record; the raw listing accepts it.
    Mock::given(method("GET"))
        .and(path("/api/s/default/stat/sta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "mac": 42 }]
        })))
        .mount(&server)
        .await;

    assert!(client.probe().await);
}

#[tokio::test]
async fn test_probe_fails_when_nothing_answers() {
    let (_server, client) = setup().await;
    assert!(!client.probe().await);
}

#[tokio::test]
async fn test_probe_on_unreachable_controller() {
    let client = LocalClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
        "default".into(),
    );
    assert!(!client.probe().await);
    assert!(client.list_active_clients().await.is_empty());
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let server = MockServer::start().await;
    let key = SecretString::from("local-secret".to_string());
    let client = LocalClient::new(
        Url::parse(&server.uri()).unwrap(),
        "default".into(),
        &key,
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/proxy/network/v2/api/site/default/clients/active"))
        .and(header("X-API-KEY", "local-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.try_list_active_clients().await.is_ok());
}
