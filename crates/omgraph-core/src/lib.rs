//! omgraph-core - database-agnostic access to property-graph databases.
//!
//! This crate provides the vertex and edge types, the [`Connection`] trait
//! implemented by backends, the Cypher query builders and the object mapper.
//! Backend adapters live in `omgraph-stores`.
//!
//! # Example
//!
//! ```ignore
//! use omgraph_core::{graph_record, ConnectionConfig, GenericStore};
//!
//! let config = ConnectionConfig::from_env()?;
//! let connection = omgraph_stores::ConnectionFactory::create(config).await?;
//! let store = GenericStore::new(connection);
//!
//! let stored = store.persist_vertex(&person).await?;
//! let found = store.read_vertex(&Person { name: "Tom".into(), ..Default::default() }).await?;
//! ```

pub mod config;
pub mod error;
pub mod omg;
pub mod query;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use error::{ErrorCode, GraphError, GraphResult};
pub use omg::{
    GenericStore, GraphObject, GraphObjectKind, GraphRecord, Mapper, Persisted, SerdeMapper,
    VertexRelation,
};
pub use query::{EdgeQueryBuilder, VertexQueryBuilder};
pub use registry::{ConnectorFn, ConnectorRegistry};
pub use traits::Connection;
pub use types::{
    Edge, EdgeFetchMode, EdgeQuery, GraphElement, Identifier, PropertyMap, QueryMode,
    QueryResult, Row, Vertex, WriteMode,
};
