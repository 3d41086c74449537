#![allow(clippy::unwrap_used)]
// Interface resolution and link negotiation against a mocked lab server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labwire_core::{
    ConnectionConfig, CoreError, Identifier, InterfaceKind, LinkPayload, Workbench,
};

const LAB: &str = "0f6a2c7e-1111-4c3b-9d2e-5a7b8c9d0e1f";
const NODE_A: &str = "aaaaaaaa-0000-4000-8000-00000000000a";
const NODE_B: &str = "bbbbbbbb-0000-4000-8000-00000000000b";
const IF_A1: &str = "a1a1a1a1-0000-4000-8000-0000000000a1";
const IF_A2: &str = "a2a2a2a2-0000-4000-8000-0000000000a2";
const IF_A3: &str = "a3a3a3a3-0000-4000-8000-0000000000a3";
const IF_B1: &str = "b1b1b1b1-0000-4000-8000-0000000000b1";
const IF_B2: &str = "b2b2b2b2-0000-4000-8000-0000000000b2";
const LINK: &str = "1e1e1e1e-0000-4000-8000-00000000001e";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Workbench) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"tok\""))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/authok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = ConnectionConfig::new(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        SecretString::from("hunter2".to_string()),
    );
    let workbench = Workbench::new(&config).unwrap();
    (server, workbench)
}

fn id(raw: &str) -> Identifier {
    Identifier::from(raw)
}

async fn mount_interface_list(server: &MockServer, node: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/labs/{LAB}/nodes/{node}/interfaces")))
        .and(query_param("operational", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_interface(
    server: &MockServer,
    interface: &str,
    detail: serde_json::Value,
    expected_fetches: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v0/labs/{LAB}/interfaces/{interface}")))
        .and(query_param("operational", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

fn physical(connected: bool) -> serde_json::Value {
    json!({ "type": "physical", "slot": 0, "is_connected": connected })
}

// ── Interface resolution ────────────────────────────────────────────

#[tokio::test]
async fn test_find_available_physical_stops_at_first_match() {
    let (server, workbench) = setup().await;

    // Concatenated identifiers, the quirk the normalizer exists for.
    mount_interface_list(&server, NODE_A, json!(format!("{IF_A1}{IF_A2}{IF_A3}"))).await;
    mount_interface(&server, IF_A1, physical(true), 1).await;
    mount_interface(&server, IF_A2, physical(false), 1).await;
    mount_interface(&server, IF_A3, physical(false), 0).await;

    let found = workbench
        .find_available_physical(&id(LAB), &id(NODE_A))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.id, id(IF_A2));
    assert_eq!(found.kind, InterfaceKind::Physical);
    assert!(!found.connected);
}

#[tokio::test]
async fn test_find_available_physical_returns_none_when_nothing_qualifies() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!({ IF_A1: "Loopback0", IF_A2: "eth0" })).await;
    mount_interface(&server, IF_A1, json!({ "type": "loopback", "is_connected": false }), 1).await;
    // No `is_connected` at all: treated as connected.
    mount_interface(&server, IF_A2, json!({ "slot": 0 }), 1).await;

    let found = workbench
        .find_available_physical(&id(LAB), &id(NODE_A))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_list_physical_describes_every_interface() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!([IF_A1, IF_A2, IF_A3])).await;
    mount_interface(&server, IF_A1, json!({ "type": "loopback", "label": "Loopback0" }), 1).await;
    mount_interface(&server, IF_A2, json!({ "slot": 0, "label": "eth0", "is_connected": true }), 1)
        .await;
    mount_interface(&server, IF_A3, json!({ "slot": 1, "label": "eth1", "is_connected": false }), 1)
        .await;

    let physical = workbench
        .list_physical(&id(LAB), &id(NODE_A))
        .await
        .unwrap();

    let labels: Vec<_> = physical.iter().map(|d| d.label.as_deref()).collect();
    assert_eq!(labels, vec![Some("eth0"), Some("eth1")]);
}

#[tokio::test]
async fn test_unexpected_interface_list_shape() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!(42)).await;

    let err = workbench
        .list_interfaces(&id(LAB), &id(NODE_A))
        .await
        .unwrap_err();
    match err {
        CoreError::UnexpectedShape { endpoint, shape } => {
            assert!(endpoint.contains("/interfaces"), "got: {endpoint}");
            assert!(shape.contains("number"), "got: {shape}");
        }
        other => panic!("expected UnexpectedShape, got: {other:?}"),
    }
}

// ── Link negotiation ────────────────────────────────────────────────

#[tokio::test]
async fn test_link_interfaces_falls_back_to_second_variant() {
    let (server, workbench) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A1, "i2": IF_B1 })))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown field i1"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "src_int": IF_A1, "dst_int": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap();

    assert_eq!(outcome.link, id(LINK));
    assert_eq!(outcome.variant, LinkPayload::SourceDestination);
    assert_eq!(outcome.failed_attempts.len(), 1);
    assert_eq!(outcome.failed_attempts[0].variant, LinkPayload::InterfacePair);
    assert_eq!(outcome.failed_attempts[0].status, Some(400));
    assert!(outcome.failed_attempts[0].error.contains("unknown field i1"));
}

#[tokio::test]
async fn test_link_interfaces_survives_transport_failure_on_first_variant() {
    let (server, _) = setup().await;
    let mut config = ConnectionConfig::new(
        Url::parse(&server.uri()).unwrap(),
        "admin",
        SecretString::from("hunter2".to_string()),
    );
    config.timeout = Duration::from_millis(200);
    let workbench = Workbench::new(&config).unwrap();

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A1, "i2": IF_B1 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": LINK }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "src_int": IF_A1, "dst_int": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap();

    assert_eq!(outcome.variant, LinkPayload::SourceDestination);
    assert_eq!(outcome.failed_attempts.len(), 1);
    assert_eq!(outcome.failed_attempts[0].variant, LinkPayload::InterfacePair);
    assert_eq!(outcome.failed_attempts[0].status, None);
}

#[tokio::test]
async fn test_link_interfaces_treats_missing_id_as_rejection() {
    let (server, workbench) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A1, "i2": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "detail": "ignored" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "src_int": IF_A1, "dst_int": IF_B1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap();
    assert_eq!(outcome.link, id(LINK));
    assert_eq!(outcome.failed_attempts[0].status, None);
}

#[tokio::test]
async fn test_link_interfaces_exhausts_every_variant() {
    let (server, workbench) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid payload"))
        .expect(2)
        .mount(&server)
        .await;

    let err = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap_err();

    match &err {
        CoreError::LinkVariantsExhausted { lab, attempts } => {
            assert_eq!(lab, &id(LAB));
            let variants: Vec<_> = attempts.iter().map(|a| a.variant).collect();
            assert_eq!(
                variants,
                vec![LinkPayload::InterfacePair, LinkPayload::SourceDestination]
            );
            assert!(attempts.iter().all(|a| a.status == Some(422)));
        }
        other => panic!("expected LinkVariantsExhausted, got: {other:?}"),
    }
    let text = err.to_string();
    assert!(text.contains("i1/i2"), "{text}");
    assert!(text.contains("src_int/dst_int"), "{text}");
}

#[tokio::test]
async fn test_custom_variant_order_is_respected() {
    let (server, workbench) = setup().await;
    let workbench = workbench.with_link_order(vec![LinkPayload::SourceDestination]);

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "src_int": IF_A1, "dst_int": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap();
    assert_eq!(outcome.variant, LinkPayload::SourceDestination);
    assert!(outcome.failed_attempts.is_empty());
}

#[tokio::test]
async fn test_empty_variant_order_falls_back_to_preference() {
    let (server, workbench) = setup().await;
    let workbench = workbench.with_link_order(Vec::new());
    assert_eq!(workbench.negotiator().order(), LinkPayload::preference().as_slice());

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A1, "i2": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_interfaces(&id(LAB), &id(IF_A1), &id(IF_B1))
        .await
        .unwrap();
    assert_eq!(outcome.link, id(LINK));
    assert!(outcome.failed_attempts.is_empty());
}

#[tokio::test]
async fn test_link_nodes_resolves_free_interfaces() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!([IF_A1, IF_A2])).await;
    mount_interface(&server, IF_A1, physical(true), 1).await;
    mount_interface(&server, IF_A2, physical(false), 1).await;
    mount_interface_list(&server, NODE_B, json!([IF_B1, IF_B2])).await;
    mount_interface(&server, IF_B1, physical(false), 1).await;
    mount_interface(&server, IF_B2, physical(false), 0).await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A2, "i2": IF_B1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_nodes(&id(LAB), &id(NODE_A), &id(NODE_B))
        .await
        .unwrap();

    assert_eq!(outcome.link, id(LINK));
    assert_eq!(outcome.interface_a, id(IF_A2));
    assert_eq!(outcome.interface_b, id(IF_B1));
    assert_eq!(outcome.variant, LinkPayload::InterfacePair);
}

#[tokio::test]
async fn test_link_nodes_on_same_node_uses_two_interfaces() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!([IF_A1, IF_A2])).await;
    // The second search skips A1 without fetching it again.
    mount_interface(&server, IF_A1, physical(false), 1).await;
    mount_interface(&server, IF_A2, physical(false), 1).await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .and(body_json(json!({ "i1": IF_A1, "i2": IF_A2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = workbench
        .link_nodes(&id(LAB), &id(NODE_A), &id(NODE_A))
        .await
        .unwrap();
    assert_eq!(outcome.interface_a, id(IF_A1));
    assert_eq!(outcome.interface_b, id(IF_A2));
}

#[tokio::test]
async fn test_link_nodes_fails_fast_without_free_interface() {
    let (server, workbench) = setup().await;

    mount_interface_list(&server, NODE_A, json!([IF_A1])).await;
    mount_interface(&server, IF_A1, physical(false), 1).await;
    mount_interface_list(&server, NODE_B, json!([IF_B1])).await;
    mount_interface(&server, IF_B1, physical(true), 1).await;

    Mock::given(method("POST"))
        .and(path(format!("/api/v0/labs/{LAB}/links")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": LINK })))
        .expect(0)
        .mount(&server)
        .await;

    let err = workbench
        .link_nodes(&id(LAB), &id(NODE_A), &id(NODE_B))
        .await
        .unwrap_err();

    match err {
        CoreError::NoAvailableInterface { ref lab, ref node } => {
            assert_eq!(lab, &id(LAB));
            assert_eq!(node, &id(NODE_B));
        }
        ref other => panic!("expected NoAvailableInterface, got: {other:?}"),
    }
    assert!(err.is_not_found());
}
