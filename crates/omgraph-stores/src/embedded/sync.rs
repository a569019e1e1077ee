//! SQLite <-> petgraph synchronization.
//!
//! Provides functions to load graph data from SQLite into petgraph
//! and persist new elements back to SQLite.

use rusqlite::{params, Connection};

use omgraph_core::error::GraphResult;
use omgraph_core::types::PropertyMap;

use super::graph::{DbIdIndex, EdgeWeight, GraphOps, PropertyGraph, VertexNode};
use super::sqlite_error;

/// Load the entire graph from SQLite into petgraph.
///
/// Called on open to hydrate the in-memory graph. Edges whose endpoints are
/// missing are skipped.
pub fn load_graph(conn: &Connection, graph: &mut PropertyGraph, db_id_index: &mut DbIdIndex) -> GraphResult<()> {
    let mut ops = GraphOps::new(graph, db_id_index);
    ops.clear();

    let mut stmt = conn
        .prepare("SELECT id, labels, properties FROM vertices ORDER BY id")
        .map_err(sqlite_error)?;
    let vertices = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let labels: String = row.get(1)?;
            let properties: String = row.get(2)?;
            Ok((id, labels, properties))
        })
        .map_err(sqlite_error)?;

    for vertex in vertices {
        let (id, labels, properties) = vertex.map_err(sqlite_error)?;
        ops.add_vertex(VertexNode::new(
            id,
            serde_json::from_str(&labels)?,
            serde_json::from_str(&properties)?,
        ));
    }

    let mut stmt = conn
        .prepare("SELECT id, source_id, target_id, edge_type, properties FROM edges ORDER BY id")
        .map_err(sqlite_error)?;
    let edges = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let source_id: i64 = row.get(1)?;
            let target_id: i64 = row.get(2)?;
            let edge_type: String = row.get(3)?;
            let properties: String = row.get(4)?;
            Ok((id, source_id, target_id, edge_type, properties))
        })
        .map_err(sqlite_error)?;

    for edge in edges {
        let (id, source_id, target_id, edge_type, properties) = edge.map_err(sqlite_error)?;
        let weight = EdgeWeight::new(id, edge_type, serde_json::from_str(&properties)?);
        if ops.add_edge(source_id, target_id, weight).is_none() {
            tracing::warn!(edge_id = id, source_id, target_id, "skipping edge with missing endpoint");
        }
    }

    tracing::debug!(
        vertices = ops.node_count(),
        edges = ops.edge_count(),
        "loaded embedded graph"
    );
    Ok(())
}

/// Insert a vertex row and return its database ID.
pub fn save_vertex(conn: &Connection, labels: &[String], properties: &PropertyMap) -> GraphResult<i64> {
    let labels = serde_json::to_string(labels)?;
    let properties = serde_json::to_string(properties)?;
    conn.execute(
        "INSERT INTO vertices (labels, properties) VALUES (?1, ?2)",
        params![labels, properties],
    )
    .map_err(sqlite_error)?;
    Ok(conn.last_insert_rowid())
}

/// Insert an edge row and return its database ID.
pub fn save_edge(
    conn: &Connection,
    source_id: i64,
    target_id: i64,
    edge_type: &str,
    properties: &PropertyMap,
) -> GraphResult<i64> {
    let properties = serde_json::to_string(properties)?;
    conn.execute(
        "INSERT INTO edges (source_id, target_id, edge_type, properties) VALUES (?1, ?2, ?3, ?4)",
        params![source_id, target_id, edge_type, properties],
    )
    .map_err(sqlite_error)?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::schema::init_schema;
    use serde_json::json;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_save_and_load() {
        let conn = setup();
        let mut props = PropertyMap::new();
        props.insert("name".into(), json!("Tom"));

        let tom = save_vertex(&conn, &["Person".into()], &props).unwrap();
        let jerry = save_vertex(&conn, &["Person".into(), "Mouse".into()], &PropertyMap::new()).unwrap();
        save_edge(&conn, tom, jerry, "CHASES", &PropertyMap::new()).unwrap();

        let mut graph = PropertyGraph::new();
        let mut index = DbIdIndex::new();
        load_graph(&conn, &mut graph, &mut index).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let node = &graph[index[&tom]];
        assert_eq!(node.labels, vec!["Person".to_string()]);
        assert_eq!(node.properties["name"], json!("Tom"));
        assert_eq!(graph[index[&jerry]].labels.len(), 2);
    }

    #[test]
    fn test_load_replaces_existing_state() {
        let conn = setup();
        save_vertex(&conn, &["Person".into()], &PropertyMap::new()).unwrap();

        let mut graph = PropertyGraph::new();
        let mut index = DbIdIndex::new();
        load_graph(&conn, &mut graph, &mut index).unwrap();
        load_graph(&conn, &mut graph, &mut index).unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(index.len(), 1);
    }
}
