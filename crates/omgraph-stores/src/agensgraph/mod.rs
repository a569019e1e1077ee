//! AgensGraph connection.
//!
//! AgensGraph is a graph extension of PostgreSQL, so connections are plain
//! Postgres connections drawn from a deadpool-postgres pool. A database hosts
//! several graphs; every statement is prefixed with `SET graph_path` and runs
//! in its own transaction, read-only for read queries.
//!
//! AgensGraph refuses to introduce new labels through `MERGE`. Set
//! `write_mode = create` to store vertices of labels the graph has not seen.

pub mod entity;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::config::SslMode;
use tokio_postgres::{NoTls, SimpleQueryMessage};

use omgraph_core::config::ConnectionConfig;
use omgraph_core::error::{ErrorCode, GraphError, GraphResult};
use omgraph_core::traits::Connection;
use omgraph_core::types::{
    Edge, EdgeFetchMode, EdgeQuery, PropertyMap, QueryMode, QueryResult, Vertex, WriteMode,
};

use crate::cypher::{self, EDGE_VAR, END_VAR, START_VAR, STORED_EDGE_VAR, VERTEX_VAR};

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Protocol value that turns on TLS.
pub const TLS_PROTOCOL: &str = "tls";

/// Option keys accepted in [`ConnectionConfig::options`].
pub const DB_NAME_OPTION: &str = "dbName";
pub const GRAPH_NAME_OPTION: &str = "graphName";
pub const POOL_SIZE_OPTION: &str = "poolSize";

const DEFAULT_POOL_SIZE: usize = 16;

type TextRow = HashMap<String, Option<String>>;

/// Connection to an AgensGraph database.
pub struct AgensConnection {
    pool: Pool,
    graph_name: String,
    query_timeout: Duration,
    write_mode: WriteMode,
}

impl AgensConnection {
    /// Create a connection pool for the configured database and graph.
    ///
    /// Fails if the host, credentials, database name or graph name are missing.
    pub async fn new(config: &ConnectionConfig) -> GraphResult<Self> {
        let pg_config = pg_config(config)?;
        let graph_name = graph_name(config)?;
        let pool_size = match config.option(POOL_SIZE_OPTION) {
            Some(size) => size.parse().map_err(|_| {
                GraphError::configuration(format!("{} must be a number, got {}", POOL_SIZE_OPTION, size))
            })?,
            None => DEFAULT_POOL_SIZE,
        };

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| GraphError::connection_with_source(ErrorCode::ConnFailed, "failed to create connection pool", e))?;

        tracing::info!(host = %config.host, graph = %graph_name, pool_size, "agensgraph pool ready");

        Ok(Self {
            pool,
            graph_name,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            write_mode: config.write_mode,
        })
    }

    /// Run `text` against the graph and collect the rows as text.
    async fn run(&self, text: &str, mode: QueryMode) -> GraphResult<Vec<TextRow>> {
        let statement = format!("SET graph_path = {};{}", self.graph_name, text);
        tracing::debug!(query = %statement, ?mode, "executing");

        let rows = async {
            let mut client = self.pool.get().await.map_err(|e| {
                GraphError::connection_with_source(ErrorCode::ConnFailed, "failed to get connection from pool", e)
            })?;
            let txn = client
                .build_transaction()
                .read_only(mode == QueryMode::Read)
                .start()
                .await
                .map_err(pg_error)?;
            let messages = txn.simple_query(&statement).await.map_err(pg_error)?;
            txn.commit().await.map_err(pg_error)?;
            Ok::<_, GraphError>(text_rows(messages))
        };

        tokio::time::timeout(self.query_timeout, rows)
            .await
            .map_err(|_| GraphError::timeout(format!("agensgraph query timed out after {:?}", self.query_timeout)))?
    }
}

impl std::fmt::Debug for AgensConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgensConnection")
            .field("graph_name", &self.graph_name)
            .field("query_timeout", &self.query_timeout)
            .field("write_mode", &self.write_mode)
            .finish()
    }
}

#[async_trait]
impl Connection for AgensConnection {
    async fn query_vertex(
        &self,
        label: &str,
        selectors: &PropertyMap,
        filters: &PropertyMap,
        _params: &PropertyMap,
    ) -> GraphResult<Vec<Vertex>> {
        let text = cypher::match_vertex(label, selectors, filters)?;
        self.run(&text, QueryMode::Read)
            .await?
            .iter()
            .map(|row| entity::parse_vertex(column(row, VERTEX_VAR)?))
            .collect()
    }

    async fn query_edge(&self, request: &EdgeQuery) -> GraphResult<Vec<Edge>> {
        let text = cypher::match_edge(request)?;
        let rows = self.run(&text, QueryMode::Read).await?;

        rows.iter()
            .map(|row| {
                let edge = entity::parse_edge(column(row, EDGE_VAR)?)?;
                match request.fetch_mode {
                    EdgeFetchMode::VertexIds => Ok(edge),
                    EdgeFetchMode::CompleteVertex => {
                        let start = entity::parse_vertex(column(row, START_VAR)?)?;
                        let end = entity::parse_vertex(column(row, END_VAR)?)?;
                        Ok(attach_endpoints(edge, start, end))
                    }
                }
            })
            .collect()
    }

    async fn execute_query(
        &self,
        text: &str,
        mode: QueryMode,
        _params: &PropertyMap,
    ) -> GraphResult<QueryResult> {
        let rows = self
            .run(text, mode)
            .await?
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (key, value.map_or(serde_json::Value::Null, serde_json::Value::String)))
                    .collect()
            })
            .collect();
        Ok(QueryResult { rows })
    }

    async fn store_vertex(&self, vertex: &mut Vertex) -> GraphResult<()> {
        let text = cypher::store_vertex(vertex, self.write_mode)?;
        let rows = self.run(&text, QueryMode::Write).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::unexpected_result("failed to store vertex"))?;
        let stored = entity::parse_vertex(column(row, START_VAR)?)?;
        vertex.id = stored.id;
        Ok(())
    }

    async fn store_edge(&self, edge: &mut Edge) -> GraphResult<()> {
        let text = cypher::store_edge(edge)?;
        let rows = self.run(&text, QueryMode::Write).await?;
        let row = rows
            .first()
            .ok_or_else(|| GraphError::unexpected_result("failed to store edge"))?;

        let source = entity::parse_vertex(column(row, START_VAR)?)?;
        let destination = entity::parse_vertex(column(row, END_VAR)?)?;
        let stored = entity::parse_edge(column(row, STORED_EDGE_VAR)?)?;

        if let Some(vertex) = edge.source.as_deref_mut() {
            vertex.id = source.id.clone();
        }
        if let Some(vertex) = edge.destination.as_deref_mut() {
            vertex.id = destination.id.clone();
        }
        edge.id = stored.id;
        edge.source_id = source.id;
        edge.destination_id = destination.id;
        Ok(())
    }

    async fn close(&self) -> GraphResult<()> {
        self.pool.close();
        Ok(())
    }
}

fn pg_error(e: tokio_postgres::Error) -> GraphError {
    GraphError::connection_with_source(ErrorCode::ConnOperationFailed, "agensgraph query failed", e)
}

fn pg_config(config: &ConnectionConfig) -> GraphResult<tokio_postgres::Config> {
    if config.host.is_empty() {
        return Err(GraphError::configuration(
            "hostname must be specified to establish connection",
        ));
    }
    let (username, password) = config.credentials("agensgraph")?;
    let db_name = config
        .database
        .as_deref()
        .or_else(|| config.option(DB_NAME_OPTION))
        .ok_or_else(|| GraphError::configuration("agensgraph requires a database name"))?;

    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port.unwrap_or(DEFAULT_PORT))
        .user(username)
        .password(password)
        .dbname(db_name)
        .connect_timeout(Duration::from_secs(config.query_timeout_secs))
        .ssl_mode(if config.protocol == TLS_PROTOCOL {
            SslMode::Require
        } else {
            SslMode::Disable
        });
    Ok(pg)
}

fn graph_name(config: &ConnectionConfig) -> GraphResult<String> {
    let name = config
        .graph_name
        .as_deref()
        .or_else(|| config.option(GRAPH_NAME_OPTION))
        .ok_or_else(|| GraphError::configuration("graph name must be specified"))?;
    if !entity::is_valid_graph_name(name) {
        return Err(GraphError::configuration(format!("invalid graph name: {}", name)));
    }
    Ok(name.to_string())
}

/// Rows of the last result set; the `SET` statement produces none.
fn text_rows(messages: Vec<SimpleQueryMessage>) -> Vec<TextRow> {
    messages
        .into_iter()
        .filter_map(|message| match message {
            SimpleQueryMessage::Row(row) => Some(
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, column)| (column.name().to_string(), row.get(i).map(str::to_string)))
                    .collect(),
            ),
            _ => None,
        })
        .collect()
}

fn column<'a>(row: &'a TextRow, key: &str) -> GraphResult<&'a str> {
    row.get(key)
        .and_then(|value| value.as_deref())
        .ok_or_else(|| GraphError::unexpected_result(format!("column {} is missing from the result", key)))
}

fn attach_endpoints(edge: Edge, start: Vertex, end: Vertex) -> Edge {
    if start.id.is_some() && start.id == edge.source_id {
        edge.with_source(start).with_destination(end)
    } else {
        edge.with_source(end).with_destination(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omgraph_core::types::Identifier;

    fn valid_config() -> ConnectionConfig {
        ConnectionConfig::builder()
            .graph_type("agens")
            .host("db.local")
            .credentials("agens", "secret")
            .database("graphs")
            .graph_name("movies")
            .build()
    }

    #[test]
    fn test_pg_config_defaults() {
        let pg = pg_config(&valid_config()).unwrap();
        assert_eq!(pg.get_ports(), &[DEFAULT_PORT]);
        assert_eq!(pg.get_dbname(), Some("graphs"));
        assert_eq!(pg.get_user(), Some("agens"));
        assert_eq!(pg.get_ssl_mode(), SslMode::Disable);
    }

    #[test]
    fn test_pg_config_tls_and_db_option() {
        let mut cfg = valid_config();
        cfg.protocol = TLS_PROTOCOL.to_string();
        cfg.port = Some(6543);
        cfg.database = None;
        cfg.options.insert(DB_NAME_OPTION.into(), "fromopt".into());

        let pg = pg_config(&cfg).unwrap();
        assert_eq!(pg.get_ssl_mode(), SslMode::Require);
        assert_eq!(pg.get_ports(), &[6543]);
        assert_eq!(pg.get_dbname(), Some("fromopt"));
    }

    #[test]
    fn test_pg_config_requires_settings() {
        let mut cfg = valid_config();
        cfg.database = None;
        assert_eq!(pg_config(&cfg).unwrap_err().code(), ErrorCode::CfgInvalid);

        let mut cfg = valid_config();
        cfg.host.clear();
        assert!(pg_config(&cfg).is_err());

        let mut cfg = valid_config();
        cfg.password = None;
        assert!(pg_config(&cfg).is_err());
    }

    #[test]
    fn test_graph_name() {
        assert_eq!(graph_name(&valid_config()).unwrap(), "movies");

        let mut cfg = valid_config();
        cfg.graph_name = None;
        assert!(graph_name(&cfg).is_err());
        cfg.options.insert(GRAPH_NAME_OPTION.into(), "people".into());
        assert_eq!(graph_name(&cfg).unwrap(), "people");

        cfg.graph_name = Some("bad name;".into());
        assert!(graph_name(&cfg).is_err());
    }

    #[test]
    fn test_attach_endpoints_follows_stored_direction() {
        let edge = entity::parse_edge("knows[4.1][3.2,3.1]{}").unwrap();
        let tom = entity::parse_vertex(r#"person[3.1]{"name": "Tom"}"#).unwrap();
        let jerry = entity::parse_vertex(r#"person[3.2]{"name": "Jerry"}"#).unwrap();

        let edge = attach_endpoints(edge, tom, jerry);
        assert_eq!(edge.source.unwrap().id, Some(Identifier::new("3.2")));
        assert_eq!(edge.destination.unwrap().id, Some(Identifier::new("3.1")));
    }

    #[test]
    fn test_column_lookup() {
        let mut row = TextRow::new();
        row.insert("v".into(), Some("person[3.1]{}".into()));
        row.insert("n".into(), None);
        assert_eq!(column(&row, "v").unwrap(), "person[3.1]{}");
        assert!(column(&row, "n").is_err());
        assert!(column(&row, "x").is_err());
    }
}
