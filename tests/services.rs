//! Service surface tests: authorization, labels and registration.

mod common;

use common::{ids, seed_abc, Harness};
use nodepool::control::authz::{actions, kinds, ANY};
use nodepool::control::{Grant, GrantAuthorizer, SubjectContext};
use nodepool::error::{StatusCode, StatusMapping};
use nodepool::services::{registration_channel, RegisterRequest};
use nodepool::{Label, Query, Selector};
use std::collections::HashMap;
use tokio::sync::watch;

fn grant(subject: &str, action: &str, kind: &str, id: &str) -> Grant {
    Grant {
        subject: subject.into(),
        action: action.into(),
        resource_kind: kind.into(),
        resource_id: id.into(),
    }
}

/// Alice may claim for and read acme, and label node A.
fn alice_harness() -> Harness {
    Harness::with_authorizer(GrantAuthorizer::with_grants(vec![
        grant("alice", actions::NODE_PUT, kinds::ORG, "acme"),
        grant("alice", actions::NODE_GET, kinds::ORG, "acme"),
        grant("alice", actions::NODE_GET, kinds::NODE, ANY),
        grant("alice", actions::NODE_LABEL_PUT, kinds::NODE, "A"),
        grant("alice", actions::NODE_LABEL_DELETE, kinds::NODE, "A"),
    ]))
}

// ============================================================================
// Node service
// ============================================================================

#[test]
fn pool_reads_are_open() {
    let h = alice_harness();
    seed_abc(&h.store);
    let registry = h.registry();

    assert_eq!(registry.nodes.get_pool_node("A").unwrap().id.as_str(), "A");
    assert_eq!(registry.nodes.list_pool_nodes().unwrap().len(), 3);
    assert_eq!(registry.nodes.list_all_nodes().unwrap().len(), 3);

    let query = Query::all().and(Selector::eq("zone", "eu"));
    assert_eq!(ids(&registry.nodes.query_pool_nodes(&query).unwrap()), vec!["A", "B"]);
}

#[test]
fn org_reads_are_authorized() {
    let h = alice_harness();
    seed_abc(&h.store);
    let registry = h.registry();
    let alice = SubjectContext::new("alice");
    let bob = SubjectContext::new("bob");

    let eu = Query::all().and(Selector::eq("zone", "eu"));
    registry.nodes.claim_ownership(&alice, &eu, "acme").unwrap();

    assert_eq!(registry.nodes.get_org_node(&alice, "A", "acme").unwrap().org, "acme");
    assert_eq!(
        ids(&registry.nodes.query_org_nodes(&alice, &Query::all(), "acme").unwrap()),
        vec!["A", "B"]
    );
    assert_eq!(registry.nodes.list_org_nodes("acme").unwrap().len(), 2);

    let err = registry.nodes.get_org_node(&bob, "A", "acme").unwrap_err();
    assert_eq!(StatusMapping::to_status_code(&err), StatusCode::PermissionDenied);
    assert!(registry
        .nodes
        .query_org_nodes(&bob, &Query::all(), "acme")
        .unwrap_err()
        .is_forbidden());
    assert!(registry
        .nodes
        .claim_ownership(&bob, &Query::all(), "acme")
        .unwrap_err()
        .is_forbidden());
}

#[test]
fn get_org_node_miss_is_not_found() {
    let h = alice_harness();
    seed_abc(&h.store);
    let registry = h.registry();

    let err = registry
        .nodes
        .get_org_node(&SubjectContext::new("alice"), "A", "acme")
        .unwrap_err();
    assert_eq!(StatusMapping::to_status_code(&err), StatusCode::NotFound);
}

// ============================================================================
// Label service
// ============================================================================

#[test]
fn put_label_is_authorized_per_node() {
    let h = alice_harness();
    seed_abc(&h.store);
    let registry = h.registry();
    let alice = SubjectContext::new("alice");

    let updated = registry
        .labels
        .put_label(&alice, "A", "", Label::bool("gpu", true))
        .unwrap();
    assert!(updated.label("gpu").is_some());

    let err = registry
        .labels
        .put_label(&alice, "B", "", Label::bool("gpu", true))
        .unwrap_err();
    assert!(err.is_forbidden());
    assert!(registry.nodes.get_pool_node("B").unwrap().label("gpu").is_none());
}

#[test]
fn delete_absent_label_returns_unchanged_node() {
    let h = alice_harness();
    seed_abc(&h.store);
    let registry = h.registry();
    let alice = SubjectContext::new("alice");
    let before = registry.nodes.get_pool_node("A").unwrap();

    let after = registry.labels.delete_label(&alice, "A", "", "rack").unwrap();
    assert_eq!(after.labels, before.labels);

    let after = registry.labels.delete_label(&alice, "A", "", "zone").unwrap();
    assert_eq!(after.labels.len(), 1);
}

#[test]
fn label_on_missing_node_is_not_found() {
    let h = Harness::new();
    let registry = h.registry();

    let err = registry
        .labels
        .put_label(&SubjectContext::anonymous(), "ghost", "", Label::bool("gpu", true))
        .unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Registration
// ============================================================================

fn request(zone: &str) -> RegisterRequest {
    let mut resources = HashMap::new();
    resources.insert("cpu".to_string(), 8.0);
    RegisterRequest {
        labels: vec![Label::string("zone", zone)],
        resources,
        bind_address: format!("{}.agent:7000", zone),
    }
}

#[test]
fn register_assigns_fresh_ids_into_pool() {
    let h = Harness::new();
    let registry = h.registry();

    let first = registry.registration.register(request("eu")).unwrap();
    let second = registry.registration.register(request("eu")).unwrap();
    assert_ne!(first, second);

    let node = registry.nodes.get_pool_node(first.as_str()).unwrap();
    assert!(!node.claimed());
    assert_eq!(node.resources["cpu"], 8.0);
    assert_eq!(node.bind_address, "eu.agent:7000");
}

#[tokio::test]
async fn registration_round_trip_over_channel() {
    let h = Harness::new();
    let registry = h.registry();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (client, listener) = registration_channel(registry.registration.clone(), 4, shutdown_rx);
    let listener = tokio::spawn(listener.run());

    let id = client.register(request("us")).await.unwrap();
    let node = registry.nodes.get_pool_node(id.as_str()).unwrap();
    assert_eq!(node.label("zone").unwrap().string_value(), "us");

    drop(client);
    assert_eq!(listener.await.unwrap(), 1);
}

#[tokio::test]
async fn registration_failure_is_replied() {
    let h = Harness::new();
    let registry = h.registry();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (client, listener) = registration_channel(registry.registration.clone(), 4, shutdown_rx);
    tokio::spawn(listener.run());

    let bad = RegisterRequest {
        labels: vec![Label::string("a/b", "x")],
        ..Default::default()
    };
    let err = client.register(bad).await.unwrap_err();
    assert_eq!(StatusMapping::to_status_code(&err), StatusCode::InvalidArgument);
    assert!(registry.nodes.list_pool_nodes().unwrap().is_empty());
}

#[tokio::test]
async fn listener_stops_on_shutdown() {
    let h = Harness::new();
    let registry = h.registry();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (client, listener) = registration_channel(registry.registration.clone(), 4, shutdown_rx);
    let listener = tokio::spawn(listener.run());

    client.register(request("eu")).await.unwrap();
    shutdown_tx.send(true).unwrap();
    assert_eq!(listener.await.unwrap(), 1);

    assert!(client.register(request("eu")).await.is_err());
}
