//! Integration tests for the generic store over the embedded graph.
//!
//! Run with logging:
//! ```bash
//! RUST_LOG=omgraph_stores=debug cargo test -p omgraph-stores --test embedded_store_test
//! ```

#![cfg(feature = "embedded")]

use std::sync::Arc;

use omgraph_core::omg::GraphObjectKind;
use omgraph_core::{
    graph_record, Connection, ConnectionConfig, EdgeFetchMode, EdgeQuery, ErrorCode,
    GenericStore, GraphObject, Persisted, PropertyMap, Vertex, VertexRelation, WriteMode,
};
use omgraph_stores::{ConnectionFactory, EmbeddedConnection, EMBEDDED};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Person {
    name: String,
    age: Option<i32>,
}
graph_record!(Person { name => "fullName" });

impl GraphObject for Person {
    fn label(&self) -> String {
        "Person".to_string()
    }

    fn kind(&self) -> GraphObjectKind {
        GraphObjectKind::Vertex
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Knows {
    since: Option<i64>,
}
graph_record!(Knows);

impl GraphObject for Knows {
    fn label(&self) -> String {
        "KNOWS".to_string()
    }

    fn kind(&self) -> GraphObjectKind {
        GraphObjectKind::Relationship
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn person(name: &str, age: Option<i32>) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

fn by_name(name: &str) -> Person {
    person(name, None)
}

#[tokio::test]
async fn test_vertex_round_trip() {
    init_tracing();
    let store = GenericStore::new(ConnectionFactory::embedded_in_memory().unwrap());

    let stored = store.persist_vertex(&person("Tom", Some(30))).await.unwrap();
    assert!(stored.id.is_some());
    assert_eq!(stored.properties["fullName"], json!("Tom"));

    let found = store.read_vertex(&by_name("Tom")).await.unwrap();
    assert_eq!(found, vec![person("Tom", Some(30))]);

    assert!(store.read_vertex(&by_name("Nobody")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_merge_mode_reuses_vertices() {
    init_tracing();
    let store = GenericStore::new(ConnectionFactory::embedded_in_memory().unwrap());

    let first = store.persist_vertex(&person("Tom", Some(30))).await.unwrap();
    let second = store.persist_vertex(&person("Tom", Some(30))).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.read_vertex(&by_name("Tom")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_mode_duplicates_vertices() {
    init_tracing();
    let connection = EmbeddedConnection::in_memory()
        .unwrap()
        .with_write_mode(WriteMode::Create);
    let store = GenericStore::new(Arc::new(connection));

    let first = store.persist_vertex(&person("Tom", Some(30))).await.unwrap();
    let second = store.persist_vertex(&person("Tom", Some(30))).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(store.read_vertex(&by_name("Tom")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_relation_round_trip() {
    init_tracing();
    let store = GenericStore::new(ConnectionFactory::embedded_in_memory().unwrap());

    let relation = VertexRelation::new(
        person("Tom", Some(30)),
        Knows { since: Some(1999) },
        person("Jerry", Some(7)),
    );
    let edge = match store.persist_relation(&relation).await.unwrap() {
        Persisted::Edge(edge) => edge,
        other => panic!("expected an edge, got {:?}", other),
    };
    assert!(edge.id.is_some());
    assert!(edge.source_id.is_some());
    assert!(edge.destination_id.is_some());

    let query = VertexRelation::new(by_name("Tom"), Knows::default(), by_name("Jerry"));
    let found = store.read_relation(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source, Some(person("Tom", Some(30))));
    assert_eq!(found[0].relationship, Some(Knows { since: Some(1999) }));
    assert_eq!(found[0].destination, Some(person("Jerry", Some(7))));

    // The endpoints were merged into existing vertices, not duplicated.
    assert_eq!(store.read_vertex(&by_name("Tom")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_isolated_relation_stores_vertex() {
    init_tracing();
    let store = GenericStore::new(ConnectionFactory::embedded_in_memory().unwrap());

    let relation = VertexRelation::<Person, Knows, Person>::isolated(person("Spike", None));
    match store.persist_relation(&relation).await.unwrap() {
        Persisted::Vertex(vertex) => assert!(vertex.id.is_some()),
        other => panic!("expected a vertex, got {:?}", other),
    }
    assert_eq!(store.read_vertex(&by_name("Spike")).await.unwrap().len(), 1);

    let err = store.read_relation(&relation).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValInvalidRelation);
}

#[tokio::test]
async fn test_edge_query_by_endpoint_ids() {
    init_tracing();
    let connection = ConnectionFactory::embedded_in_memory().unwrap();

    let mut tom = Vertex::new(["Person"]).with_property("fullName", "Tom");
    let mut jerry = Vertex::new(["Person"]).with_property("fullName", "Jerry");
    connection.store_vertex(&mut tom).await.unwrap();
    connection.store_vertex(&mut jerry).await.unwrap();

    let mut edge = omgraph_core::Edge::new("KNOWS")
        .with_property("since", 2001)
        .with_endpoint_ids(tom.id.clone().unwrap(), jerry.id.clone().unwrap());
    connection.store_edge(&mut edge).await.unwrap();

    let mut selectors = PropertyMap::new();
    selectors.insert("fullName".into(), json!("Jerry"));
    let request = EdgeQuery::new("KNOWS")
        .start_labels(["Person"])
        .end_labels(["Person"])
        .end_selectors(selectors)
        .fetch_mode(EdgeFetchMode::VertexIds);

    let edges = connection.query_edge(&request).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source_id, tom.id);
    assert_eq!(edges[0].destination_id, jerry.id);
    assert!(edges[0].source.is_none());
}

#[tokio::test]
async fn test_file_backed_graph_survives_reconnect() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");

    let config = ConnectionConfig::builder()
        .graph_type(EMBEDDED)
        .database(path.to_string_lossy())
        .build();

    let connection = ConnectionFactory::create(config.clone()).await.unwrap();
    let store = GenericStore::new(connection.clone());
    let relation = VertexRelation::new(
        person("Tom", Some(30)),
        Knows { since: Some(1999) },
        person("Jerry", None),
    );
    store.persist_relation(&relation).await.unwrap();
    connection.close().await.unwrap();
    drop(store);
    drop(connection);

    let reopened = GenericStore::new(ConnectionFactory::create(config).await.unwrap());
    let query = VertexRelation::new(by_name("Tom"), Knows::default(), by_name("Jerry"));
    let found = reopened.read_relation(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].relationship, Some(Knows { since: Some(1999) }));
}

#[test]
fn test_blocking_round_trip() {
    let store = GenericStore::new(ConnectionFactory::embedded_in_memory().unwrap());
    let found = tokio_test::block_on(async {
        store.persist_vertex(&person("Tyke", Some(1))).await?;
        store.read_vertex(&by_name("Tyke")).await
    })
    .unwrap();
    assert_eq!(found, vec![person("Tyke", Some(1))]);
}
