//! Registry of named connectors.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::{GraphError, GraphResult};
use crate::traits::Connection;

/// Opens a connection from a configuration.
pub type ConnectorFn =
    Arc<dyn Fn(ConnectionConfig) -> BoxFuture<'static, GraphResult<Arc<dyn Connection>>> + Send + Sync>;

/// Maps graph type names to connectors.
///
/// Registering a name twice replaces the earlier connector.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, ConnectorFn>,
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("connectors", &self.names())
            .finish()
    }
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under `graph_type`.
    pub fn register<F, Fut>(&mut self, graph_type: impl Into<String>, connector: F)
    where
        F: Fn(ConnectionConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GraphResult<Arc<dyn Connection>>> + Send + 'static,
    {
        let connector: ConnectorFn = Arc::new(
            move |config: ConnectionConfig| -> BoxFuture<'static, GraphResult<Arc<dyn Connection>>> {
                Box::pin(connector(config))
            },
        );
        self.connectors.insert(graph_type.into(), connector);
    }

    /// Look up the connector for `graph_type`.
    pub fn get(&self, graph_type: &str) -> Option<ConnectorFn> {
        self.connectors.get(graph_type).cloned()
    }

    /// Whether a connector is registered for `graph_type`.
    pub fn contains(&self, graph_type: &str) -> bool {
        self.connectors.contains_key(graph_type)
    }

    /// Registered graph types, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Open a connection using the connector named by `config.graph_type`.
    pub async fn connect(&self, config: ConnectionConfig) -> GraphResult<Arc<dyn Connection>> {
        let connector = self
            .get(&config.graph_type)
            .ok_or_else(|| GraphError::UnsupportedProvider {
                provider: config.graph_type.clone(),
            })?;
        tracing::debug!(graph_type = %config.graph_type, "opening connection");
        connector(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, EdgeQuery, PropertyMap, QueryMode, QueryResult, Vertex};
    use async_trait::async_trait;

    struct NullConnection;

    #[async_trait]
    impl Connection for NullConnection {
        async fn query_vertex(
            &self,
            _label: &str,
            _selectors: &PropertyMap,
            _filters: &PropertyMap,
            _params: &PropertyMap,
        ) -> GraphResult<Vec<Vertex>> {
            Ok(vec![])
        }

        async fn query_edge(&self, _query: &EdgeQuery) -> GraphResult<Vec<Edge>> {
            Ok(vec![])
        }

        async fn execute_query(
            &self,
            _query: &str,
            _mode: QueryMode,
            _params: &PropertyMap,
        ) -> GraphResult<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn store_vertex(&self, _vertex: &mut Vertex) -> GraphResult<()> {
            Ok(())
        }

        async fn store_edge(&self, _edge: &mut Edge) -> GraphResult<()> {
            Ok(())
        }

        async fn close(&self) -> GraphResult<()> {
            Ok(())
        }
    }

    fn registry() -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::new();
        registry.register("null", |_config| async {
            Ok(Arc::new(NullConnection) as Arc<dyn Connection>)
        });
        registry
    }

    #[tokio::test]
    async fn test_connect_registered() {
        let config = ConnectionConfig::builder().graph_type("null").build();
        let connection = registry().connect(config).await.unwrap();
        assert!(connection.query_edge(&EdgeQuery::new("KNOWS")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_unknown() {
        let config = ConnectionConfig::builder().graph_type("nope").build();
        let Err(err) = registry().connect(config).await else {
            panic!("unknown graph type connected");
        };
        assert!(matches!(err, GraphError::UnsupportedProvider { ref provider } if provider == "nope"));
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert!(registry.contains("null"));
        assert!(registry.get("neo4j").is_none());
        assert_eq!(registry.names(), vec!["null"]);
    }
}
