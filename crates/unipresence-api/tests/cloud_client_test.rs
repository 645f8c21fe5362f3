#![allow(clippy::unwrap_used)]
// Integration tests for `CloudClient` and the `ControllerClient` facade.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use unipresence_api::{BackendKind, ControllerClient, Credentials, Error, TransportConfig};

fn inventory() -> serde_json::Value {
    json!({
        "data": [
            {
                "hostId": "host-1",
                "devices": [
                    { "id": "d1", "mac": "AABBCCDDEEFF", "name": "Dream Machine", "model": "UDM-Pro", "productLine": "network", "ip": "192.168.1.1" },
                    { "id": "d2", "mac": "112233445566", "name": "Hallway AP", "model": "U6-Lite", "productLine": "network", "ip": "192.168.1.20" },
                    { "id": "d3", "mac": "FFEEDDCCBBAA", "name": "Doorbell", "model": "G4 Doorbell", "productLine": "protect" }
                ]
            },
            {
                "hostId": "host-2",
                "devices": [
                    { "id": "d4", "mac": "010203040506", "name": "Other AP", "model": "U7-Pro", "productLine": "network" }
                ]
            }
        ],
        "httpStatusCode": 200,
        "traceId": "abc"
    })
}

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let credentials = Credentials::Cloud {
        key: SecretString::from("cloud-secret".to_string()),
        host_id: "host-1".into(),
    };
    let client = ControllerClient::new(
        Url::parse(&server.uri()).unwrap(),
        "default",
        &credentials,
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

#[tokio::test]
async fn test_cloud_clients_are_network_products_of_host() {
    let (server, client) = setup().await;
    assert_eq!(client.kind(), BackendKind::Cloud);

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .and(header("X-API-Key", "cloud-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory()))
        .mount(&server)
        .await;

    let clients = client.list_active_clients().await;
    let names: Vec<_> = clients.iter().filter_map(|c| c.name.as_deref()).collect();
    assert_eq!(names, vec!["Dream Machine", "Hallway AP"]);
}

#[tokio::test]
async fn test_cloud_access_points_match_model_pattern() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory()))
        .mount(&server)
        .await;

    let aps = client.list_access_points().await;
    assert_eq!(aps.len(), 1);
    assert_eq!(aps[0].mac.as_deref(), Some("112233445566"));
    assert_eq!(aps[0].ip.as_deref(), Some("192.168.1.20"));
}

#[tokio::test]
async fn test_cloud_has_no_traffic_samples() {
    let (_server, client) = setup().await;
    assert_eq!(client.short_window_traffic("aa:bb:cc:dd:ee:ff").await, None);
}

#[tokio::test]
async fn test_cloud_http_error_is_classified() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let result = client.try_list_active_clients().await;
    assert!(
        matches!(result, Err(Error::Http { status: 401, .. })),
        "expected HTTP 401, got: {result:?}"
    );
    assert!(client.list_access_points().await.is_empty());
    assert!(!client.probe().await);
}

#[tokio::test]
async fn test_cloud_sessions_have_no_alternate_addresses() {
    let (_server, client) = setup().await;
    let other = Url::parse("https://example.com").unwrap();
    assert!(client.with_base_url(other).is_none());
}

#[tokio::test]
async fn test_cycle_inventory_is_fetched_once() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory()))
        .expect(2)
        .mount(&server)
        .await;

    assert!(client.probe().await);
    let (clients, access_points) = client.try_fetch_inventory().await;
    assert_eq!(clients.unwrap().len(), 2);
    assert_eq!(access_points.unwrap().len(), 1);

    server.verify().await;
}

#[tokio::test]
async fn test_cycle_inventory_failure_fails_both_listings() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ea/devices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let (clients, access_points) = client.try_fetch_inventory().await;
    assert!(matches!(clients, Err(Error::Http { status: 503, .. })));
    assert!(access_points.is_err());
}
