//! Connection trait implemented by every graph backend.

use async_trait::async_trait;

use crate::error::GraphResult;
use crate::types::{Edge, EdgeQuery, PropertyMap, QueryMode, QueryResult, Vertex};

/// Uniform access to a property-graph database.
///
/// Implementations are shared as `Arc<dyn Connection>` and must be safe to
/// call concurrently.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Fetch vertices carrying `label`.
    ///
    /// Selectors pick nodes in the match pattern; without selectors every
    /// node with the label is selected. Filters then narrow the selection.
    async fn query_vertex(
        &self,
        label: &str,
        selectors: &PropertyMap,
        filters: &PropertyMap,
        params: &PropertyMap,
    ) -> GraphResult<Vec<Vertex>>;

    /// Fetch edges matching the request.
    ///
    /// The fetch mode of the request decides whether the endpoints come back
    /// as identifiers only or as complete vertices.
    async fn query_edge(&self, query: &EdgeQuery) -> GraphResult<Vec<Edge>>;

    /// Execute raw query text. The mode selects the access mode of the
    /// session for drivers that distinguish reads from writes.
    async fn execute_query(
        &self,
        query: &str,
        mode: QueryMode,
        params: &PropertyMap,
    ) -> GraphResult<QueryResult>;

    /// Persist a vertex and set its identifier.
    async fn store_vertex(&self, vertex: &mut Vertex) -> GraphResult<()>;

    /// Persist an edge together with its endpoints. On success the edge id,
    /// the endpoint ids and the ids of any materialized endpoints are set.
    async fn store_edge(&self, edge: &mut Edge) -> GraphResult<()>;

    /// Release the connection. Backends without an explicit session treat
    /// this as a no-op.
    async fn close(&self) -> GraphResult<()>;
}
