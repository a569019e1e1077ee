//! Connection configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{GraphError, GraphResult};
use crate::types::WriteMode;

/// Settings used to open a [`Connection`](crate::traits::Connection).
///
/// `graph_type` selects the connector in the registry. The remaining fields
/// are interpreted by the connector; unknown backend-specific settings go in
/// `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Registry key of the connector, e.g. `neo4j`, `memgraph`, `agens`, `embedded`.
    pub graph_type: String,
    /// Transport scheme. Neo4j-family drivers use it in the target URI;
    /// AgensGraph enables TLS when it is `tls`.
    pub protocol: String,
    /// Database host.
    pub host: String,
    /// Database port. Connectors fall back to their default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Username for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Graph within the database, for backends that host several graphs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_name: Option<String>,
    /// How vertices are introduced by writes.
    pub write_mode: WriteMode,
    /// Per-query timeout in seconds.
    pub query_timeout_secs: u64,
    /// Backend-specific options.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            graph_type: "embedded".to_string(),
            protocol: "bolt".to_string(),
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            database: None,
            graph_name: None,
            write_mode: WriteMode::Merge,
            query_timeout_secs: 5,
            options: HashMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> GraphResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| GraphError::Configuration(e.to_string())),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| GraphError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| GraphError::Configuration(e.to_string())),
            _ => Err(GraphError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from `OMGRAPH_*` environment variables, reading a
    /// `.env` file first when one is present.
    pub fn from_env() -> GraphResult<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(graph_type) = std::env::var("OMGRAPH_GRAPH_TYPE") {
            config.graph_type = graph_type.to_lowercase();
        }
        if let Ok(protocol) = std::env::var("OMGRAPH_PROTOCOL") {
            config.protocol = protocol;
        }
        if let Ok(host) = std::env::var("OMGRAPH_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("OMGRAPH_PORT") {
            config.port = Some(port.parse().map_err(|_| {
                GraphError::configuration(format!("OMGRAPH_PORT is not a valid port: {}", port))
            })?);
        }
        config.username = std::env::var("OMGRAPH_USERNAME").ok();
        config.password = std::env::var("OMGRAPH_PASSWORD").ok();
        config.database = std::env::var("OMGRAPH_DATABASE").ok();
        config.graph_name = std::env::var("OMGRAPH_GRAPH_NAME").ok();

        if let Ok(mode) = std::env::var("OMGRAPH_WRITE_MODE") {
            config.write_mode = match mode.to_lowercase().as_str() {
                "create" => WriteMode::Create,
                "merge" => WriteMode::Merge,
                other => {
                    return Err(GraphError::configuration(format!(
                        "OMGRAPH_WRITE_MODE must be merge or create, got {}",
                        other
                    )))
                }
            };
        }
        if let Ok(timeout) = std::env::var("OMGRAPH_QUERY_TIMEOUT_SECS") {
            config.query_timeout_secs = timeout.parse().map_err(|_| {
                GraphError::configuration(format!(
                    "OMGRAPH_QUERY_TIMEOUT_SECS is not a number: {}",
                    timeout
                ))
            })?;
        }

        Ok(config)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Target URI of the form `protocol://host[:port]`.
    pub fn target_uri(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.protocol, self.host, port),
            None => format!("{}://{}", self.protocol, self.host),
        }
    }

    /// Look up a backend-specific option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Username and password, or a configuration error naming the backend.
    pub fn credentials(&self, backend: &str) -> GraphResult<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) => Ok((user, password)),
            _ => Err(GraphError::configuration(format!(
                "{} requires both a username and a password",
                backend
            ))),
        }
    }
}

/// Builder for ConnectionConfig.
#[derive(Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the connector name.
    pub fn graph_type(mut self, graph_type: impl Into<String>) -> Self {
        self.config.graph_type = graph_type.into();
        self
    }

    /// Set the protocol.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.protocol = protocol.into();
        self
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    /// Set username and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Set the graph name.
    pub fn graph_name(mut self, graph_name: impl Into<String>) -> Self {
        self.config.graph_name = Some(graph_name.into());
        self
    }

    /// Set the write mode.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.config.write_mode = mode;
        self
    }

    /// Set the per-query timeout.
    pub fn query_timeout_secs(mut self, secs: u64) -> Self {
        self.config.query_timeout_secs = secs;
        self
    }

    /// Add a backend-specific option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.options.insert(key.into(), value.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
