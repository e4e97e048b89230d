#![allow(clippy::unwrap_used)]
// Integration tests for `OdlClient` using wiremock.

use secrecy::SecretString;
use serde_json::{Map, json};
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowsync_api::flows::{flow_path, table_path};
use flowsync_api::{ContentType, Credentials, Error, Flow, Method, OdlClient, TopologyView};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OdlClient) {
    let server = MockServer::start().await;
    let creds = Credentials::new("admin", SecretString::from("secret".to_owned()));
    let client = OdlClient::with_client(reqwest::Client::new(), &server.uri(), creds).unwrap();
    (server, client)
}

fn topology(nodes: &[&str]) -> serde_json::Value {
    let nodes: Vec<_> = nodes.iter().map(|n| json!({ "node-id": n })).collect();
    json!({ "topology": [{ "topology-id": "flow:1", "node": nodes }] })
}

// ── Transport ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_request_sends_auth_and_yang_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/restconf/config/some/resource"))
        .and(basic_auth("admin", "secret"))
        .and(header("content-type", "application/yang.data+json"))
        .and(header("accept", "application/yang.data+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let value = client
        .request(Method::Get, "/restconf/config/some/resource", None, ContentType::Json)
        .await
        .unwrap();

    assert_eq!(value, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_request_uses_requested_content_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/restconf/xml"))
        .and(header("accept", "application/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<data/>"))
        .expect(1)
        .mount(&server)
        .await;

    let value = client
        .request(Method::Get, "/restconf/xml", None, ContentType::Xml)
        .await
        .unwrap();

    // Non-JSON bodies are logged and dropped, not raised.
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_empty_success_body_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/restconf/config/x"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let value = client
        .request(Method::Delete, "/restconf/config/x", None, ContentType::Json)
        .await
        .unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn test_non_success_carries_status_and_body() {
    let (server, client) = setup().await;

    let body = json!({"errors": {"error": [{"error-message": "boom"}]}});
    Mock::given(method("GET"))
        .and(path("/restconf/config/x"))
        .respond_with(ResponseTemplate::new(500).set_body_json(&body))
        .mount(&server)
        .await;

    let err = client
        .request(Method::Get, "/restconf/config/x", None, ContentType::Json)
        .await
        .unwrap_err();

    match &err {
        Error::HttpStatus { status, body } => {
            assert_eq!(*status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert_eq!(err.controller_message().unwrap(), "boom");
}

// ── Topology ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_node_ids_merges_views_sorted_without_controller() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(TopologyView::Config.path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(topology(&["openflow:2", "controller-config", "openflow:10"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TopologyView::Operational.path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(topology(&["openflow:1", "openflow:2"])),
        )
        .mount(&server)
        .await;

    let nodes = client.node_ids().await.unwrap();

    assert_eq!(nodes, vec!["openflow:1", "openflow:10", "openflow:2"]);
}

#[tokio::test]
async fn test_node_ids_tolerates_missing_view() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(TopologyView::Config.path()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(TopologyView::Operational.path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(topology(&["openflow:3"])))
        .mount(&server)
        .await;

    assert_eq!(client.node_ids().await.unwrap(), vec!["openflow:3"]);
}

#[tokio::test]
async fn test_node_ids_without_node_list_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"topology": [{"topology-id": "flow:1"}]})),
        )
        .mount(&server)
        .await;

    assert!(client.node_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_node_ids_propagates_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(TopologyView::Config.path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.node_ids().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
}

// ── Flows ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_table_decodes_flows() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(table_path("openflow:1").unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flow-node-inventory:table": [{
                "id": 0,
                "flow": [
                    {"id": "10", "priority": 100},
                    {"id": "11_0", "priority": 99}
                ]
            }]
        })))
        .mount(&server)
        .await;

    let tables = client.get_table("openflow:1").await.unwrap();

    assert_eq!(tables.len(), 1);
    let ids: Vec<_> = tables[0].flow.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["10", "11_0"]);
    assert_eq!(tables[0].flow[1].base_id(), "11");
}

#[tokio::test]
async fn test_put_flow_wraps_body() {
    let (server, client) = setup().await;

    let mut body = Map::new();
    body.insert("priority".into(), json!(65535));
    let flow = Flow::new("5", body);

    Mock::given(method("PUT"))
        .and(path(flow_path("openflow:1", "5").unwrap()))
        .and(body_json(json!({"flow": [{"id": "5", "priority": 65535}]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client.put_flow("openflow:1", &flow).await.unwrap();
}

#[tokio::test]
async fn test_delete_table_surfaces_404() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(table_path("openflow:9").unwrap()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.delete_table("openflow:9").await.unwrap_err();
    assert!(err.is_not_found());
}
