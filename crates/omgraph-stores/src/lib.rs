//! omgraph-stores - Graph database connections for omgraph.
//!
//! This crate provides [`Connection`] implementations for the supported
//! property-graph databases and a factory that selects one from a
//! [`ConnectionConfig`].
//!
//! # Supported Backends
//!
//! - **Embedded** (feature: `embedded`, default) - petgraph + SQLite, in process
//! - **Neo4j** (feature: `neo4j`) - Neo4j over Bolt
//! - **Memgraph** (feature: `memgraph`) - Memgraph (Neo4j-compatible)
//! - **AgensGraph** (feature: `agensgraph`) - AgensGraph over the Postgres protocol

mod factory;

#[cfg(any(feature = "neo4j", feature = "memgraph", feature = "agensgraph"))]
mod cypher;

#[cfg(feature = "embedded")]
pub mod embedded;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
mod neo4j;

#[cfg(feature = "memgraph")]
pub mod memgraph;

#[cfg(feature = "agensgraph")]
pub mod agensgraph;

pub use factory::{ConnectionFactory, AGENS, EMBEDDED, MEMGRAPH, NEO4J};

#[cfg(feature = "embedded")]
pub use embedded::EmbeddedConnection;

#[cfg(any(feature = "neo4j", feature = "memgraph"))]
pub use neo4j::Neo4jConnection;

#[cfg(feature = "memgraph")]
pub use memgraph::MemgraphConnection;

#[cfg(feature = "agensgraph")]
pub use agensgraph::AgensConnection;

// Re-export core types
pub use omgraph_core::config::ConnectionConfig;
pub use omgraph_core::registry::ConnectorRegistry;
pub use omgraph_core::traits::Connection;
