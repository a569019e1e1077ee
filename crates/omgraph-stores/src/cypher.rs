//! Cypher statements shared by the query-text backends.
//!
//! Every backend binds results to the same variables so rows can be decoded
//! uniformly: `v` for a queried vertex, `r` for a queried edge, `sv`/`ev` for
//! edge endpoints and `rel` for a stored edge.

use omgraph_core::error::{ErrorCode, GraphError, GraphResult};
use omgraph_core::query::{EdgeQueryBuilder, VertexQueryBuilder};
use omgraph_core::types::{Edge, EdgeFetchMode, EdgeQuery, PropertyMap, QueryMode, Vertex, WriteMode};

pub const VERTEX_VAR: &str = "v";
pub const EDGE_VAR: &str = "r";
pub const START_VAR: &str = "sv";
pub const END_VAR: &str = "ev";
pub const STORED_EDGE_VAR: &str = "rel";

/// `MATCH` for vertices carrying `label`.
pub fn match_vertex(label: &str, selectors: &PropertyMap, filters: &PropertyMap) -> GraphResult<String> {
    VertexQueryBuilder::new()
        .query_mode(QueryMode::Read)
        .label(label)
        .selector(selectors)
        .filters(filters)
        .var_name(VERTEX_VAR)
        .build()
}

/// `MATCH` for the edges of a request. Endpoints are bound to `sv`/`ev`
/// when complete vertices are requested.
pub fn match_edge(request: &EdgeQuery) -> GraphResult<String> {
    let builder = EdgeQueryBuilder::from_request(request)
        .query_mode(QueryMode::Read)
        .var_name(EDGE_VAR);
    let builder = match request.fetch_mode {
        EdgeFetchMode::CompleteVertex => builder.start_vertex_var_name(START_VAR).end_vertex_var_name(END_VAR),
        EdgeFetchMode::VertexIds => builder,
    };
    builder.build()
}

/// `MERGE` or `CREATE` for a single vertex, returned as `sv`.
pub fn store_vertex(vertex: &Vertex, write_mode: WriteMode) -> GraphResult<String> {
    VertexQueryBuilder::new()
        .query_mode(QueryMode::Write)
        .labels(vertex.labels.clone())
        .selector(&present(&vertex.properties))
        .var_name(START_VAR)
        .write_mode(write_mode)
        .build()
}

/// `MERGE` for an edge together with its materialized endpoints, returning
/// `sv`, `rel` and `ev`.
pub fn store_edge(edge: &Edge) -> GraphResult<String> {
    let (source, destination) = endpoints(edge)?;
    EdgeQueryBuilder::new()
        .query_mode(QueryMode::Write)
        .fetch_mode(EdgeFetchMode::CompleteVertex)
        .start_vertex_labels(source.labels.clone())
        .start_vertex_selector(&present(&source.properties))
        .start_vertex_var_name(START_VAR)
        .end_vertex_labels(destination.labels.clone())
        .end_vertex_selector(&present(&destination.properties))
        .end_vertex_var_name(END_VAR)
        .label(edge.edge_type.clone())
        .selector(&present(&edge.properties))
        .var_name(STORED_EDGE_VAR)
        .build()
}

/// Properties with a value. Cypher rejects `MERGE` on a null property.
fn present(properties: &PropertyMap) -> PropertyMap {
    properties
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The materialized endpoints of an edge being stored.
pub fn endpoints(edge: &Edge) -> GraphResult<(&Vertex, &Vertex)> {
    let source = edge.source.as_deref().ok_or_else(|| {
        GraphError::validation(ErrorCode::ValMissingEndpoint, "source vertex must be specified for an edge")
    })?;
    let destination = edge.destination.as_deref().ok_or_else(|| {
        GraphError::validation(
            ErrorCode::ValMissingEndpoint,
            "destination vertex must be specified for an edge",
        )
    })?;
    Ok((source, destination))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(key: &str, value: impl Into<serde_json::Value>) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert(key.to_string(), value.into());
        map
    }

    #[test]
    fn test_match_vertex_binds_v() {
        let query = match_vertex("Person", &one("name", "Tom"), &PropertyMap::new()).unwrap();
        assert_eq!(query, "MATCH (v:Person{name:'Tom'})  return v");
    }

    #[test]
    fn test_match_vertex_with_filter() {
        let query = match_vertex("Person", &PropertyMap::new(), &one("age", 30)).unwrap();
        assert_eq!(query, "MATCH (v:Person)  WHERE v.age=30 return v");
    }

    #[test]
    fn test_match_edge_fetch_modes() {
        let request = EdgeQuery::new("KNOWS").start_labels(["Person"]).end_labels(["Person"]);
        assert_eq!(
            match_edge(&request).unwrap(),
            "MATCH (pe:Person)-[r:KNOWS]-(pe1:Person)  return r"
        );

        let request = request.fetch_mode(EdgeFetchMode::CompleteVertex);
        assert_eq!(
            match_edge(&request).unwrap(),
            "MATCH (sv:Person)-[r:KNOWS]-(ev:Person)  return sv, r, ev"
        );
    }

    #[test]
    fn test_store_vertex_write_modes() {
        let vertex = Vertex::new(["Person"]).with_property("name", "Tom");
        assert_eq!(
            store_vertex(&vertex, WriteMode::Merge).unwrap(),
            "MERGE (sv:Person{name:'Tom'})  return sv"
        );
        assert_eq!(
            store_vertex(&vertex, WriteMode::Create).unwrap(),
            "CREATE (sv:Person{name:'Tom'})  return sv"
        );
    }

    #[test]
    fn test_store_edge() {
        let edge = Edge::new("KNOWS")
            .with_source(Vertex::new(["Person"]).with_property("name", "Tom"))
            .with_destination(Vertex::new(["Person"]).with_property("name", "Jerry"));
        assert_eq!(
            store_edge(&edge).unwrap(),
            "MERGE (sv:Person{name:'Tom'})-[rel:KNOWS]-(ev:Person{name:'Jerry'})  return sv, rel, ev"
        );
    }

    #[test]
    fn test_store_skips_null_properties() {
        let jerry = Vertex::new(["Person"])
            .with_property("name", "Jerry")
            .with_property("age", serde_json::Value::Null);
        let query = store_vertex(&jerry, WriteMode::Merge).unwrap();
        assert_eq!(query, "MERGE (sv:Person{name:'Jerry'})  return sv");

        let edge = Edge::new("KNOWS")
            .with_property("since", serde_json::Value::Null)
            .with_source(Vertex::new(["Person"]).with_property("name", "Tom"))
            .with_destination(jerry);
        let query = store_edge(&edge).unwrap();
        assert!(!query.contains("null"), "null in {}", query);
        assert!(query.contains("[rel:KNOWS]"));
    }

    #[test]
    fn test_store_edge_requires_endpoints() {
        let edge = Edge::new("KNOWS").with_source(Vertex::new(["Person"]));
        let err = store_edge(&edge).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValMissingEndpoint);

        let err = store_edge(&Edge::new("KNOWS")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValMissingEndpoint);
    }
}
