//! Embedded graph connection using a petgraph + SQLite hybrid architecture.
//!
//! - SQLite keeps every vertex and edge on disk (or in memory)
//! - a petgraph `DiGraph` answers structural queries without SQL
//! - the graph is hydrated from SQLite on open and kept in step on writes
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          EmbeddedConnection             │
//! ├─────────────────────────────────────────┤
//! │  ┌─────────────┐    ┌────────────────┐  │
//! │  │   SQLite    │    │   petgraph     │  │
//! │  │ (persistent)│◄──►│  (in-memory)   │  │
//! │  │             │    │  DiGraph       │  │
//! │  └─────────────┘    └────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Query text is not interpreted; [`Connection::execute_query`] reports an
//! unsupported operation.

pub mod graph;
pub mod schema;
pub mod sync;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use omgraph_core::config::ConnectionConfig;
use omgraph_core::error::{ErrorCode, GraphError, GraphResult};
use omgraph_core::traits::Connection;
use omgraph_core::types::{
    Edge, EdgeQuery, Identifier, PropertyMap, QueryMode, QueryResult, Vertex, WriteMode,
};

use graph::{parse_db_id, DbIdIndex, EdgeWeight, GraphOps, PropertyGraph, VertexNode};

/// Map a SQLite failure onto a connection error.
pub(crate) fn sqlite_error(e: rusqlite::Error) -> GraphError {
    GraphError::connection_with_source(ErrorCode::ConnOperationFailed, "sqlite operation failed", e)
}

struct State {
    conn: rusqlite::Connection,
    graph: PropertyGraph,
    db_id_index: DbIdIndex,
}

impl State {
    fn open(conn: rusqlite::Connection) -> GraphResult<Self> {
        schema::init_schema(&conn)?;
        let mut graph = PropertyGraph::new();
        let mut db_id_index = DbIdIndex::new();
        sync::load_graph(&conn, &mut graph, &mut db_id_index)?;
        Ok(Self {
            conn,
            graph,
            db_id_index,
        })
    }

    fn ops(&mut self) -> GraphOps<'_> {
        GraphOps::new(&mut self.graph, &mut self.db_id_index)
    }

    /// Reuse a vertex carrying `labels` and `properties`, or insert one.
    fn upsert_vertex(&mut self, labels: &[String], properties: &PropertyMap, mode: WriteMode) -> GraphResult<i64> {
        let State {
            conn,
            graph,
            db_id_index,
        } = self;
        let mut ops = GraphOps::new(graph, db_id_index);

        if mode == WriteMode::Merge {
            let existing = ops
                .find_vertices(labels, &[properties])
                .into_iter()
                .find_map(|idx| ops.vertex(idx).map(|node| node.db_id));
            if let Some(db_id) = existing {
                return Ok(db_id);
            }
        }

        let db_id = sync::save_vertex(conn, labels, properties)?;
        ops.add_vertex(VertexNode::new(db_id, labels.to_vec(), properties.clone()));
        Ok(db_id)
    }

    /// Check one end of an edge without writing anything. Returns the
    /// database id of an existing vertex, or `None` for a materialized
    /// vertex that still has to be stored.
    fn check_endpoint(&self, vertex: Option<&Vertex>, id: Option<&Identifier>, end: &str) -> GraphResult<Option<i64>> {
        let id = match vertex {
            Some(vertex) if vertex.id.is_none() => {
                if vertex.labels.is_empty() {
                    return Err(GraphError::validation(
                        ErrorCode::ValMissingLabel,
                        format!("{} vertex has no labels", end),
                    ));
                }
                return Ok(None);
            }
            Some(vertex) => vertex.id.as_ref(),
            None => id,
        };

        id.and_then(parse_db_id)
            .filter(|db_id| self.db_id_index.contains_key(db_id))
            .map(Some)
            .ok_or_else(|| {
                GraphError::validation(
                    ErrorCode::ValMissingEndpoint,
                    format!("{} vertex not found", end),
                )
            })
    }

    /// Store a checked endpoint that has no id yet.
    fn store_endpoint(&mut self, vertex: Option<&mut Vertex>, end: &str, mode: WriteMode) -> GraphResult<i64> {
        let vertex = vertex.ok_or_else(|| GraphError::internal(format!("{} vertex vanished while storing an edge", end)))?;
        let db_id = self.upsert_vertex(&vertex.labels, &vertex.properties, mode)?;
        vertex.id = Some(Identifier::new(db_id));
        Ok(db_id)
    }

    fn store_edge(&mut self, edge: &mut Edge, mode: WriteMode) -> GraphResult<()> {
        if edge.edge_type.is_empty() {
            return Err(GraphError::validation(ErrorCode::ValMissingLabel, "edge has no type"));
        }

        // Both ends are checked before either is written.
        let source = self.check_endpoint(edge.source.as_deref(), edge.source_id.as_ref(), "source")?;
        let target = self.check_endpoint(edge.destination.as_deref(), edge.destination_id.as_ref(), "destination")?;

        let source_id = match source {
            Some(db_id) => db_id,
            None => self.store_endpoint(edge.source.as_deref_mut(), "source", mode)?,
        };
        let target_id = match target {
            Some(db_id) => db_id,
            None => self.store_endpoint(edge.destination.as_deref_mut(), "destination", mode)?,
        };

        let State {
            conn,
            graph,
            db_id_index,
        } = self;
        let mut ops = GraphOps::new(graph, db_id_index);

        let existing = match (mode, ops.find_by_db_id(source_id), ops.find_by_db_id(target_id)) {
            (WriteMode::Merge, Some(source), Some(target)) => ops
                .find_edge(source, target, &edge.edge_type, &edge.properties)
                .and_then(|idx| ops.edge(idx))
                .map(|weight| Identifier::new(weight.db_id)),
            _ => None,
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let db_id = sync::save_edge(conn, source_id, target_id, &edge.edge_type, &edge.properties)?;
                let weight = EdgeWeight::new(db_id, edge.edge_type.clone(), edge.properties.clone());
                if ops.add_edge(source_id, target_id, weight).is_none() {
                    return Err(GraphError::internal(format!(
                        "edge {} stored without indexed endpoints",
                        db_id
                    )));
                }
                Identifier::new(db_id)
            }
        };

        edge.id = Some(id);
        edge.source_id = Some(Identifier::new(source_id));
        edge.destination_id = Some(Identifier::new(target_id));
        Ok(())
    }
}

/// In-process graph backed by SQLite.
///
/// Thread-safe via a Mutex around the SQLite connection and the graph.
pub struct EmbeddedConnection {
    state: Mutex<State>,
    write_mode: WriteMode,
}

impl EmbeddedConnection {
    /// Open (or create) a graph stored in the SQLite file at `db_path`.
    pub fn new(db_path: impl AsRef<Path>) -> GraphResult<Self> {
        let conn = rusqlite::Connection::open(db_path).map_err(sqlite_error)?;
        Self::from_sqlite(conn)
    }

    /// Create a graph that lives only as long as the connection.
    pub fn in_memory() -> GraphResult<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(sqlite_error)?;
        Self::from_sqlite(conn)
    }

    /// Create from a [`ConnectionConfig`].
    ///
    /// `database` is the SQLite path; absent or `:memory:` opens an
    /// in-memory graph.
    pub fn from_config(config: &ConnectionConfig) -> GraphResult<Self> {
        let connection = match config.database.as_deref() {
            None | Some("") | Some(":memory:") => Self::in_memory()?,
            Some(path) => Self::new(path)?,
        };
        tracing::info!(
            database = config.database.as_deref().unwrap_or(":memory:"),
            write_mode = ?config.write_mode,
            "opened embedded graph"
        );
        Ok(connection.with_write_mode(config.write_mode))
    }

    /// Set how vertices and edges are introduced on writes.
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    fn from_sqlite(conn: rusqlite::Connection) -> GraphResult<Self> {
        Ok(Self {
            state: Mutex::new(State::open(conn)?),
            write_mode: WriteMode::default(),
        })
    }

    fn lock(&self) -> GraphResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|e| GraphError::internal(e.to_string()))
    }

    /// Number of vertices in the graph.
    pub fn vertex_count(&self) -> GraphResult<usize> {
        Ok(self.lock()?.graph.node_count())
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> GraphResult<usize> {
        Ok(self.lock()?.graph.edge_count())
    }
}

impl std::fmt::Debug for EmbeddedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedConnection")
            .field("vertex_count", &self.vertex_count().unwrap_or(0))
            .field("edge_count", &self.edge_count().unwrap_or(0))
            .field("write_mode", &self.write_mode)
            .finish()
    }
}

#[async_trait]
impl Connection for EmbeddedConnection {
    async fn query_vertex(
        &self,
        label: &str,
        selectors: &PropertyMap,
        filters: &PropertyMap,
        _params: &PropertyMap,
    ) -> GraphResult<Vec<Vertex>> {
        if label.is_empty() {
            return Err(GraphError::validation(ErrorCode::ValMissingLabel, "vertex label is required"));
        }
        let mut state = self.lock()?;
        let ops = state.ops();
        let vertices: Vec<Vertex> = ops
            .find_vertices(&[label.to_string()], &[selectors, filters])
            .into_iter()
            .filter_map(|idx| ops.to_vertex(idx))
            .collect();
        tracing::debug!(label, count = vertices.len(), "queried embedded vertices");
        Ok(vertices)
    }

    async fn query_edge(&self, query: &EdgeQuery) -> GraphResult<Vec<Edge>> {
        if query.label.is_empty() {
            return Err(GraphError::validation(ErrorCode::ValMissingLabel, "edge label is required"));
        }
        let mut state = self.lock()?;
        let ops = state.ops();
        let edges: Vec<Edge> = ops
            .find_edges(query)
            .into_iter()
            .filter_map(|idx| ops.to_edge(idx, query.fetch_mode))
            .collect();
        tracing::debug!(label = %query.label, count = edges.len(), "queried embedded edges");
        Ok(edges)
    }

    async fn execute_query(
        &self,
        _query: &str,
        _mode: QueryMode,
        _params: &PropertyMap,
    ) -> GraphResult<QueryResult> {
        Err(GraphError::unsupported("the embedded graph does not execute query text"))
    }

    async fn store_vertex(&self, vertex: &mut Vertex) -> GraphResult<()> {
        if vertex.labels.is_empty() {
            return Err(GraphError::validation(ErrorCode::ValMissingLabel, "vertex has no labels"));
        }
        let db_id = self
            .lock()?
            .upsert_vertex(&vertex.labels, &vertex.properties, self.write_mode)?;
        vertex.id = Some(Identifier::new(db_id));
        Ok(())
    }

    async fn store_edge(&self, edge: &mut Edge) -> GraphResult<()> {
        self.lock()?.store_edge(edge, self.write_mode)
    }

    async fn close(&self) -> GraphResult<()> {
        Ok(())
    }
}
