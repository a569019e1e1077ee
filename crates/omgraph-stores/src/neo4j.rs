//! Neo4j connection over Bolt.
//!
//! Also serves Memgraph, which speaks the same protocol.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, BoltList, BoltMap, BoltNull, BoltType, ConfigBuilder, Graph, Node, Query, Relation, Row};

use omgraph_core::config::ConnectionConfig;
use omgraph_core::error::{ErrorCode, GraphError, GraphResult};
use omgraph_core::traits::Connection;
use omgraph_core::types::{
    Edge, EdgeFetchMode, EdgeQuery, Identifier, PropertyMap, QueryMode, QueryResult, Vertex, WriteMode,
};

use crate::cypher::{self, EDGE_VAR, END_VAR, START_VAR, STORED_EDGE_VAR, VERTEX_VAR};

/// Connection to a Neo4j-compatible database.
pub struct Neo4jConnection {
    graph: Graph,
    backend: &'static str,
    query_timeout: Duration,
    write_mode: WriteMode,
}

impl Neo4jConnection {
    /// Connect to Neo4j. Both a username and a password are required.
    pub async fn new(config: &ConnectionConfig) -> GraphResult<Self> {
        let (username, password) = config.credentials("neo4j")?;
        Self::connect(config, "neo4j", username, password).await
    }

    pub(crate) async fn connect(
        config: &ConnectionConfig,
        backend: &'static str,
        username: &str,
        password: &str,
    ) -> GraphResult<Self> {
        let uri = config.target_uri();
        let builder = ConfigBuilder::default().uri(uri.as_str()).user(username).password(password);
        let builder = match config.database.as_deref() {
            Some(db) => builder.db(db),
            None => builder,
        };
        let neo_config = builder.build().map_err(|e| {
            GraphError::connection_with_source(ErrorCode::ConnFailed, format!("invalid {} configuration", backend), e)
        })?;

        let graph = Graph::connect(neo_config).await.map_err(|e| {
            GraphError::connection_with_source(
                ErrorCode::ConnFailed,
                format!("failed to connect to {} at {}", backend, uri),
                e,
            )
        })?;
        tracing::info!(backend, uri = %uri, "connected");

        Ok(Self {
            graph,
            backend,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            write_mode: config.write_mode,
        })
    }

    async fn fetch(&self, q: Query) -> GraphResult<Vec<Row>> {
        let rows = async {
            let mut stream = self.graph.execute(q).await.map_err(driver_error)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await.map_err(driver_error)? {
                rows.push(row);
            }
            Ok::<_, GraphError>(rows)
        };
        tokio::time::timeout(self.query_timeout, rows)
            .await
            .map_err(|_| GraphError::timeout(format!("{} query timed out after {:?}", self.backend, self.query_timeout)))?
    }

    async fn fetch_text(&self, text: &str, params: &PropertyMap) -> GraphResult<Vec<Row>> {
        tracing::debug!(backend = self.backend, query = %text, "executing");
        let q = params
            .iter()
            .fold(query(text), |q, (key, value)| q.param(key, to_bolt(value)));
        self.fetch(q).await
    }
}

impl std::fmt::Debug for Neo4jConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConnection")
            .field("backend", &self.backend)
            .field("query_timeout", &self.query_timeout)
            .field("write_mode", &self.write_mode)
            .finish()
    }
}

#[async_trait]
impl Connection for Neo4jConnection {
    async fn query_vertex(
        &self,
        label: &str,
        selectors: &PropertyMap,
        filters: &PropertyMap,
        params: &PropertyMap,
    ) -> GraphResult<Vec<Vertex>> {
        let text = cypher::match_vertex(label, selectors, filters)?;
        self.fetch_text(&text, params)
            .await?
            .iter()
            .map(|row| node_to_vertex(&column::<Node>(row, VERTEX_VAR)?))
            .collect()
    }

    async fn query_edge(&self, request: &EdgeQuery) -> GraphResult<Vec<Edge>> {
        let text = cypher::match_edge(request)?;
        let rows = self.fetch_text(&text, &request.params).await?;

        rows.iter()
            .map(|row| {
                let relation = column::<Relation>(row, EDGE_VAR)?;
                let edge = relation_to_edge(&relation)?;
                match request.fetch_mode {
                    EdgeFetchMode::VertexIds => Ok(edge),
                    EdgeFetchMode::CompleteVertex => {
                        let start = node_to_vertex(&column::<Node>(row, START_VAR)?)?;
                        let end = node_to_vertex(&column::<Node>(row, END_VAR)?)?;
                        Ok(attach_endpoints(edge, &relation, start, end))
                    }
                }
            })
            .collect()
    }

    async fn execute_query(
        &self,
        text: &str,
        mode: QueryMode,
        params: &PropertyMap,
    ) -> GraphResult<QueryResult> {
        tracing::debug!(backend = self.backend, ?mode, "raw query");
        let rows = self.fetch_text(text, params).await?;
        let rows = rows
            .iter()
            .map(|row| row.to::<HashMap<String, serde_json::Value>>().map_err(decode_error))
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(QueryResult { rows })
    }

    async fn store_vertex(&self, vertex: &mut Vertex) -> GraphResult<()> {
        let text = cypher::store_vertex(vertex, self.write_mode)?;
        let rows = self.fetch_text(&text, &PropertyMap::new()).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::unexpected_result("failed to store vertex"))?;
        let node = column::<Node>(row, START_VAR)?;
        vertex.id = Some(Identifier::new(node.id()));
        Ok(())
    }

    async fn store_edge(&self, edge: &mut Edge) -> GraphResult<()> {
        let text = cypher::store_edge(edge)?;
        let rows = self.fetch_text(&text, &PropertyMap::new()).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::unexpected_result("failed to store edge"))?;

        let source = column::<Node>(row, START_VAR)?;
        let destination = column::<Node>(row, END_VAR)?;
        let relation = column::<Relation>(row, STORED_EDGE_VAR)?;

        if let Some(vertex) = edge.source.as_deref_mut() {
            vertex.id = Some(Identifier::new(source.id()));
        }
        if let Some(vertex) = edge.destination.as_deref_mut() {
            vertex.id = Some(Identifier::new(destination.id()));
        }
        edge.id = Some(Identifier::new(relation.id()));
        edge.source_id = Some(Identifier::new(source.id()));
        edge.destination_id = Some(Identifier::new(destination.id()));
        Ok(())
    }

    async fn close(&self) -> GraphResult<()> {
        // The driver pool closes its connections on drop.
        Ok(())
    }
}

fn driver_error(e: neo4rs::Error) -> GraphError {
    GraphError::connection_with_source(ErrorCode::ConnOperationFailed, "query failed", e)
}

fn decode_error(e: neo4rs::DeError) -> GraphError {
    GraphError::connection_with_source(ErrorCode::ConnUnexpectedResult, "unexpected value in result", e)
}

fn column<T>(row: &Row, key: &str) -> GraphResult<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    row.get::<T>(key).map_err(|e| {
        GraphError::connection_with_source(
            ErrorCode::ConnUnexpectedResult,
            format!("column {} is missing or has the wrong type", key),
            e,
        )
    })
}

fn node_to_vertex(node: &Node) -> GraphResult<Vertex> {
    let mut properties = PropertyMap::new();
    for key in node.keys() {
        let value = node.get::<serde_json::Value>(key).map_err(decode_error)?;
        properties.insert(key.to_string(), value);
    }
    Ok(Vertex::new(node.labels())
        .with_id(node.id())
        .with_properties(properties))
}

fn relation_to_edge(relation: &Relation) -> GraphResult<Edge> {
    let mut properties = PropertyMap::new();
    for key in relation.keys() {
        let value = relation.get::<serde_json::Value>(key).map_err(decode_error)?;
        properties.insert(key.to_string(), value);
    }
    Ok(Edge::new(relation.typ())
        .with_id(relation.id())
        .with_endpoint_ids(relation.start_node_id(), relation.end_node_id())
        .with_properties(properties))
}

/// Attach the matched vertices following the stored direction of the
/// relationship; the undirected pattern may bind them either way round.
fn attach_endpoints(edge: Edge, relation: &Relation, start: Vertex, end: Vertex) -> Edge {
    let start_id = Identifier::new(relation.start_node_id());
    if start.id.as_ref() == Some(&start_id) {
        edge.with_source(start).with_destination(end)
    } else {
        edge.with_source(end).with_destination(start)
    }
}

/// Convert a JSON value into a Bolt parameter.
pub(crate) fn to_bolt(value: &serde_json::Value) -> BoltType {
    use serde_json::Value;

    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::from(i),
            None => BoltType::from(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Array(items) => BoltType::List(BoltList::from(items.iter().map(to_bolt).collect::<Vec<_>>())),
        Value::Object(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(key.as_str().into(), to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_bolt_scalars() {
        assert!(matches!(to_bolt(&json!(null)), BoltType::Null(_)));
        assert!(matches!(to_bolt(&json!(true)), BoltType::Boolean(_)));
        assert!(matches!(to_bolt(&json!(42)), BoltType::Integer(_)));
        assert!(matches!(to_bolt(&json!(1.5)), BoltType::Float(_)));
        assert!(matches!(to_bolt(&json!("Tom")), BoltType::String(_)));
    }

    #[test]
    fn test_to_bolt_nested() {
        match to_bolt(&json!({"tags": ["a", "b"], "age": 30})) {
            BoltType::Map(map) => assert_eq!(map.value.len(), 2),
            other => panic!("expected map, got {:?}", other),
        }
        match to_bolt(&json!([1, 2, 3])) {
            BoltType::List(list) => assert_eq!(list.len(), 3),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_requires_credentials() {
        let config = ConnectionConfig::builder().graph_type("neo4j").build();
        let err = Neo4jConnection::new(&config).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CfgInvalid);
    }
}
