//! Factory for creating graph connections.

use std::sync::Arc;

use omgraph_core::config::ConnectionConfig;
use omgraph_core::error::{GraphError, GraphResult};
use omgraph_core::registry::ConnectorRegistry;
use omgraph_core::traits::Connection;

/// Graph type of the embedded petgraph + SQLite backend.
pub const EMBEDDED: &str = "embedded";
/// Graph type of Neo4j.
pub const NEO4J: &str = "neo4j";
/// Graph type of Memgraph.
pub const MEMGRAPH: &str = "memgraph";
/// Graph type of AgensGraph.
pub const AGENS: &str = "agens";

/// Factory for creating graph connections.
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Open a connection for `config.graph_type`.
    ///
    /// Graph types whose feature is disabled are reported as unsupported.
    pub async fn create(config: ConnectionConfig) -> GraphResult<Arc<dyn Connection>> {
        match config.graph_type.as_str() {
            #[cfg(feature = "embedded")]
            EMBEDDED => {
                let connection = crate::embedded::EmbeddedConnection::from_config(&config)?;
                Ok(Arc::new(connection))
            }

            #[cfg(feature = "neo4j")]
            NEO4J => {
                let connection = crate::neo4j::Neo4jConnection::new(&config).await?;
                Ok(Arc::new(connection))
            }

            #[cfg(feature = "memgraph")]
            MEMGRAPH => {
                let connection = crate::memgraph::connect(&config).await?;
                Ok(Arc::new(connection))
            }

            #[cfg(feature = "agensgraph")]
            AGENS => {
                let connection = crate::agensgraph::AgensConnection::new(&config).await?;
                Ok(Arc::new(connection))
            }

            other => Err(GraphError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }

    /// Graph types compiled into this build.
    pub fn supported() -> Vec<&'static str> {
        let mut names = Vec::new();
        #[cfg(feature = "embedded")]
        names.push(EMBEDDED);
        #[cfg(feature = "neo4j")]
        names.push(NEO4J);
        #[cfg(feature = "memgraph")]
        names.push(MEMGRAPH);
        #[cfg(feature = "agensgraph")]
        names.push(AGENS);
        names
    }

    /// A registry with a connector for every supported graph type.
    pub fn registry() -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::new();
        for name in Self::supported() {
            registry.register(name, Self::create);
        }
        registry
    }

    /// Create an in-memory embedded graph.
    #[cfg(feature = "embedded")]
    pub fn embedded_in_memory() -> GraphResult<Arc<dyn Connection>> {
        Ok(Arc::new(crate::embedded::EmbeddedConnection::in_memory()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_unknown_graph_type() {
        let config = ConnectionConfig::builder().graph_type("orientdb").build();
        let Err(err) = ConnectionFactory::create(config).await else {
            panic!("unknown graph type connected");
        };
        assert!(matches!(err, GraphError::UnsupportedProvider { ref provider } if provider == "orientdb"));
    }

    #[cfg(feature = "embedded")]
    #[tokio::test]
    async fn test_create_embedded() {
        let config = ConnectionConfig::builder().graph_type(EMBEDDED).build();
        let connection = ConnectionFactory::create(config).await.unwrap();

        let mut vertex = omgraph_core::types::Vertex::new(["Person"]).with_property("name", "Tom");
        connection.store_vertex(&mut vertex).await.unwrap();
        assert!(vertex.id.is_some());
    }

    #[cfg(feature = "embedded")]
    #[tokio::test]
    async fn test_registry_connects_embedded() {
        let registry = ConnectionFactory::registry();
        assert!(registry.contains(EMBEDDED));
        assert_eq!(registry.names().len(), ConnectionFactory::supported().len());

        let config = ConnectionConfig::builder().graph_type(EMBEDDED).build();
        let connection = registry.connect(config).await.unwrap();
        connection.close().await.unwrap();
    }

    #[test]
    fn test_supported_matches_features() {
        let supported = ConnectionFactory::supported();
        assert_eq!(supported.contains(&EMBEDDED), cfg!(feature = "embedded"));
        assert_eq!(supported.contains(&AGENS), cfg!(feature = "agensgraph"));
    }
}
