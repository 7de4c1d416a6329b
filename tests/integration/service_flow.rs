#![allow(missing_docs)]

mod fake;

use std::sync::Arc;

use fake::FakeGraph;
use palisade::{
    CancellationToken, EdgeSide, GraphError, GraphService, PropertyMap, PropertyValue,
    RetryConfig, TenantId,
};

fn service() -> (Arc<FakeGraph>, GraphService) {
    let graph = Arc::new(FakeGraph::new());
    let service = GraphService::new(graph.clone(), RetryConfig::no_backoff());
    (graph, service)
}

fn tenant(s: &str) -> TenantId {
    TenantId::new(s).expect("tenant")
}

fn person_props(name: &str) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("name".into(), PropertyValue::from(name));
    props.insert("active".into(), PropertyValue::Bool(true));
    props
}

#[tokio::test]
async fn upsert_vertex_is_idempotent() {
    let (graph, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();
    let props = person_props("alice");

    service
        .upsert_vertex(&t, "Person", "alice", &props, &cancel)
        .await
        .expect("first upsert");
    service
        .upsert_vertex(&t, "Person", "alice", &props, &cancel)
        .await
        .expect("second upsert");

    assert_eq!(graph.vertex_count(), 1);
    let stored = graph.vertex("tenant-a::alice").expect("stored vertex");
    assert_eq!(stored.label, "Person");
    assert_eq!(stored.props["name"], "alice");
    assert_eq!(stored.props["active"], "true");
    assert_eq!(stored.props["tenant_id"], "tenant-a");

    let found = service
        .query_vertices_by_label(&t, "Person", &cancel)
        .await
        .expect("query by label");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].qualified_id, "tenant-a::alice");
}

#[tokio::test]
async fn upsert_vertex_rejects_blank_label() {
    let (_, service) = service();
    let err = service
        .upsert_vertex(
            &tenant("t"),
            "  ",
            "alice",
            &PropertyMap::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidArgument(_)));
}

#[tokio::test]
async fn callers_cannot_override_reserved_properties() {
    let (graph, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    let mut props = PropertyMap::new();
    props.insert("tenant_id".into(), PropertyValue::from("evil"));
    props.insert("id".into(), PropertyValue::from("evil"));
    service
        .upsert_vertex(&t, "Person", "alice", &props, &cancel)
        .await
        .expect("upsert");

    let stored = graph.vertex("tenant-a::alice").expect("stored vertex");
    assert_eq!(stored.props["tenant_id"], "tenant-a");
    assert!(!stored.props.contains_key("id"));
}

#[tokio::test]
async fn edge_upsert_is_gated_on_both_endpoints() {
    let (graph, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    service
        .upsert_vertex(&t, "Person", "bob", &PropertyMap::new(), &cancel)
        .await
        .expect("create bob");

    // Missing out endpoint: no write happens.
    let err = service
        .upsert_edge(&t, "knows", "ghost", "bob", &PropertyMap::new(), &cancel)
        .await
        .unwrap_err();
    match err {
        GraphError::DanglingReference { side, local_id } => {
            assert_eq!(side, EdgeSide::Out);
            assert_eq!(local_id, "ghost");
        }
        other => panic!("expected DanglingReference, got {other:?}"),
    }
    assert_eq!(graph.edge_count(), 0);
    assert!(!service
        .edge_exists(&t, "ghost", "knows", "bob", &cancel)
        .await
        .expect("probe"));

    // Missing in endpoint is named too.
    let err = service
        .upsert_edge(&t, "knows", "bob", "ghost", &PropertyMap::new(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::DanglingReference {
            side: EdgeSide::In,
            ..
        }
    ));
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn edge_upsert_is_idempotent_and_applies_properties() {
    let (graph, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    for id in ["alice", "bob"] {
        service
            .upsert_vertex(&t, "Person", id, &PropertyMap::new(), &cancel)
            .await
            .expect("create vertex");
    }

    let mut props = PropertyMap::new();
    props.insert("since".into(), PropertyValue::Int(2020));
    service
        .upsert_edge(&t, "knows", "alice", "bob", &props, &cancel)
        .await
        .expect("first edge upsert");
    service
        .upsert_edge(&t, "knows", "alice", "bob", &props, &cancel)
        .await
        .expect("second edge upsert");

    assert_eq!(graph.edge_count(), 1);
    assert!(service
        .edge_exists(&t, "alice", "knows", "bob", &cancel)
        .await
        .expect("probe"));
    // Direction matters.
    assert!(!service
        .edge_exists(&t, "bob", "knows", "alice", &cancel)
        .await
        .expect("probe"));
}

#[tokio::test]
async fn property_update_requires_existing_vertex() {
    let (_, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    let err = service
        .upsert_vertex_property(
            &t,
            "missing",
            "name",
            &PropertyValue::from("x"),
            None,
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NotFound(_)));

    service
        .upsert_vertex(&t, "Person", "alice", &PropertyMap::new(), &cancel)
        .await
        .expect("create");
    service
        .upsert_vertex_property(
            &t,
            "alice",
            "name",
            &PropertyValue::from("alice"),
            None,
            &cancel,
        )
        .await
        .expect("set property");

    let value = service
        .get_vertex_property(&t, "alice", "name", &cancel)
        .await
        .expect("get property");
    assert_eq!(value.as_deref(), Some("alice"));

    // Absent property is a normal None, not an error.
    let missing = service
        .get_vertex_property(&t, "alice", "nickname", &cancel)
        .await
        .expect("get missing property");
    assert!(missing.is_none());
}

#[tokio::test]
async fn property_update_rejects_reserved_keys() {
    let (_, service) = service();
    let err = service
        .upsert_vertex_property(
            &tenant("t"),
            "alice",
            "tenant_id",
            &PropertyValue::from("evil"),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidArgument(_)));
}

#[tokio::test]
async fn tenant_override_acts_on_the_override_tenant() {
    let (graph, service) = service();
    let ambient = tenant("tenant-a");
    let background = tenant("tenant-b");
    let cancel = CancellationToken::new();

    service
        .upsert_vertex(&background, "Person", "carol", &PropertyMap::new(), &cancel)
        .await
        .expect("create under tenant-b");

    service
        .upsert_vertex_property(
            &ambient,
            "carol",
            "status",
            &PropertyValue::from("processed"),
            Some(&background),
            &cancel,
        )
        .await
        .expect("override write");

    let stored = graph.vertex("tenant-b::carol").expect("vertex");
    assert_eq!(stored.props["status"], "processed");
}

#[tokio::test]
async fn has_property_supports_presence_and_exact_match() {
    let (_, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    service
        .upsert_vertex(&t, "Person", "alice", &person_props("alice"), &cancel)
        .await
        .expect("create");

    assert!(service
        .has_property(&t, "alice", "name", None, &cancel)
        .await
        .expect("presence"));
    assert!(service
        .has_property(&t, "alice", "name", Some(&PropertyValue::from("alice")), &cancel)
        .await
        .expect("exact match"));
    assert!(!service
        .has_property(&t, "alice", "name", Some(&PropertyValue::from("bob")), &cancel)
        .await
        .expect("exact mismatch"));
    assert!(!service
        .has_property(&t, "alice", "nickname", None, &cancel)
        .await
        .expect("absent key"));
}

#[tokio::test]
async fn deletes_are_tenant_scoped() {
    let (graph, service) = service();
    let a = tenant("tenant-a");
    let b = tenant("tenant-b");
    let cancel = CancellationToken::new();

    service
        .upsert_vertex(&a, "Person", "alice", &PropertyMap::new(), &cancel)
        .await
        .expect("create");

    // A foreign tenant's delete is a no-op.
    service
        .delete_vertex(&b, "alice", &cancel)
        .await
        .expect("foreign delete");
    assert_eq!(graph.vertex_count(), 1);

    service
        .delete_vertex(&a, "alice", &cancel)
        .await
        .expect("owner delete");
    assert_eq!(graph.vertex_count(), 0);
}

#[tokio::test]
async fn delete_edge_removes_only_the_named_edge() {
    let (graph, service) = service();
    let t = tenant("tenant-a");
    let cancel = CancellationToken::new();

    for id in ["alice", "bob"] {
        service
            .upsert_vertex(&t, "Person", id, &PropertyMap::new(), &cancel)
            .await
            .expect("create vertex");
    }
    service
        .upsert_edge(&t, "knows", "alice", "bob", &PropertyMap::new(), &cancel)
        .await
        .expect("create knows");
    service
        .upsert_edge(&t, "follows", "alice", "bob", &PropertyMap::new(), &cancel)
        .await
        .expect("create follows");

    service
        .delete_edge(&t, "knows", "alice", "bob", &cancel)
        .await
        .expect("delete knows");
    assert_eq!(graph.edge_count(), 1);
    assert!(service
        .edge_exists(&t, "alice", "follows", "bob", &cancel)
        .await
        .expect("probe"));
}

/// Two tenants share a local id; neither can see or link to the other's data.
#[tokio::test]
async fn tenants_sharing_a_local_id_stay_isolated() {
    let (graph, service) = service();
    let a = tenant("tenant-a");
    let b = tenant("tenant-b");
    let cancel = CancellationToken::new();

    service
        .upsert_vertex(&a, "Person", "alice", &person_props("alice-of-a"), &cancel)
        .await
        .expect("tenant a upsert");
    service
        .upsert_vertex(&b, "Person", "alice", &person_props("alice-of-b"), &cancel)
        .await
        .expect("tenant b upsert");
    assert_eq!(graph.vertex_count(), 2);

    let seen_by_a = service
        .get_vertex(&a, "alice", &cancel)
        .await
        .expect("read under a")
        .expect("a sees its alice");
    assert_eq!(seen_by_a.qualified_id, "tenant-a::alice");
    assert_eq!(seen_by_a.properties["name"], "alice-of-a");

    let listed_by_b = service
        .query_vertices_by_label(&b, "Person", &cancel)
        .await
        .expect("list under b");
    assert_eq!(listed_by_b.len(), 1);
    assert_eq!(listed_by_b[0].qualified_id, "tenant-b::alice");

    // Tenant b can never observe an edge toward tenant a's data, whatever
    // the label.
    for label in ["knows", "owns", "anything"] {
        assert!(!service
            .edge_exists(&b, "alice", label, "alice", &cancel)
            .await
            .expect("cross-tenant probe"));
    }

    // And an unknown tenant sees nothing at all.
    let stranger = tenant("tenant-c");
    assert!(service
        .get_vertex(&stranger, "alice", &cancel)
        .await
        .expect("read under c")
        .is_none());
}
