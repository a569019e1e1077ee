//! Integration tests for query construction and object mapping.
//!
//! Exercises the public API end to end: records are mapped to vertices and
//! edges, and the resulting property maps drive the query builders.

use omgraph_core::{
    graph_record, EdgeFetchMode, EdgeQueryBuilder, GraphError, Mapper, PropertyMap, QueryMode,
    SerdeMapper, VertexQueryBuilder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Movie {
    title: String,
    released: i32,
}
graph_record!(Movie { title => "name" });

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct ActedIn {
    role: String,
}
graph_record!(ActedIn);

#[test]
fn test_mapped_vertex_drives_merge_query() {
    let movie = Movie {
        title: "Heat".into(),
        released: 1995,
    };
    let vertex = SerdeMapper.to_vertex(&movie, &[]).unwrap();
    assert_eq!(vertex.labels, vec!["Movie"]);

    let mut selector = PropertyMap::new();
    selector.insert("name".into(), vertex.properties["name"].clone());

    let query = VertexQueryBuilder::new()
        .query_mode(QueryMode::Write)
        .labels(vertex.labels.clone())
        .selector(&selector)
        .build()
        .unwrap();
    assert_eq!(query, "MERGE (mo:Movie{name:'Heat'})  return mo");
}

#[test]
fn test_mapped_edge_drives_edge_query() {
    let edge = SerdeMapper
        .to_edge(&ActedIn { role: "Neil".into() }, Some("ACTED_IN"))
        .unwrap();

    let query = EdgeQueryBuilder::new()
        .label(edge.edge_type.clone())
        .start_vertex_labels(["Person"])
        .end_vertex_labels(["Movie"])
        .selector(&edge.properties)
        .fetch_mode(EdgeFetchMode::CompleteVertex)
        .build()
        .unwrap();
    assert_eq!(
        query,
        "MATCH (pe:Person)-[ac:ACTED_IN{role:'Neil'}]-(mo:Movie)  return pe, ac, mo"
    );
}

#[test]
fn test_builder_errors_produce_no_text() {
    let result = EdgeQueryBuilder::new()
        .labels(["A", "B"])
        .start_vertex_labels(["Person"])
        .end_vertex_labels(["Movie"])
        .build();
    assert!(matches!(result, Err(GraphError::Validation { .. })));
}

#[test]
fn test_reverse_mapping_from_backend_properties() {
    let mut properties = PropertyMap::new();
    properties.insert("name".into(), json!("Ronin"));
    properties.insert("RELEASED".into(), json!(1998));
    let vertex = omgraph_core::Vertex::new(["Movie"]).with_properties(properties);

    let mut movie = Movie::default();
    SerdeMapper.from_vertex(&vertex, &mut movie).unwrap();
    assert_eq!(
        movie,
        Movie {
            title: "Ronin".into(),
            released: 1998
        }
    );
}
