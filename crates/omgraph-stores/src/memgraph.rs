//! Memgraph connection.
//! Memgraph is compatible with the Neo4j protocol.

use omgraph_core::config::ConnectionConfig;
use omgraph_core::error::GraphResult;

use crate::neo4j::Neo4jConnection;

/// Username used when the configuration names none.
pub const DEFAULT_USERNAME: &str = "memgraph";

/// Memgraph shares the Neo4j connection.
pub type MemgraphConnection = Neo4jConnection;

/// Connect to Memgraph. Missing credentials fall back to
/// [`DEFAULT_USERNAME`] and an empty password.
pub async fn connect(config: &ConnectionConfig) -> GraphResult<MemgraphConnection> {
    let (username, password) = credentials(config);
    Neo4jConnection::connect(config, "memgraph", username, password).await
}

fn credentials(config: &ConnectionConfig) -> (&str, &str) {
    (
        config.username.as_deref().unwrap_or(DEFAULT_USERNAME),
        config.password.as_deref().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credentials() {
        let config = ConnectionConfig::builder().graph_type("memgraph").build();
        assert_eq!(credentials(&config), ("memgraph", ""));

        let config = ConnectionConfig::builder().credentials("admin", "secret").build();
        assert_eq!(credentials(&config), ("admin", "secret"));
    }
}
