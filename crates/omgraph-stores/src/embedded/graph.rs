//! In-memory property graph operations using petgraph DiGraph.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use omgraph_core::types::{Edge, EdgeFetchMode, EdgeQuery, Identifier, PropertyMap, Vertex};

/// Node data in the embedded graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexNode {
    /// Database ID (from SQLite).
    pub db_id: i64,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl VertexNode {
    pub fn new(db_id: i64, labels: Vec<String>, properties: PropertyMap) -> Self {
        Self {
            db_id,
            labels,
            properties,
        }
    }

    /// Whether the node carries every given label.
    pub fn has_labels(&self, labels: &[String]) -> bool {
        labels.iter().all(|l| self.labels.contains(l))
    }

    fn to_vertex(&self) -> Vertex {
        Vertex::new(self.labels.clone())
            .with_id(self.db_id)
            .with_properties(self.properties.clone())
    }
}

/// Edge data in the embedded graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeight {
    /// Database ID (from SQLite).
    pub db_id: i64,
    pub edge_type: String,
    pub properties: PropertyMap,
}

impl EdgeWeight {
    pub fn new(db_id: i64, edge_type: impl Into<String>, properties: PropertyMap) -> Self {
        Self {
            db_id,
            edge_type: edge_type.into(),
            properties,
        }
    }
}

/// The in-memory graph type using petgraph.
pub type PropertyGraph = DiGraph<VertexNode, EdgeWeight>;

/// Index for O(1) lookups by database ID.
pub type DbIdIndex = HashMap<i64, NodeIndex>;

/// Whether every entry of `expected` is present with an equal value.
pub fn matches(properties: &PropertyMap, expected: &PropertyMap) -> bool {
    expected
        .iter()
        .all(|(key, value)| properties.get(key) == Some(value))
}

/// Graph operations on the in-memory graph.
pub struct GraphOps<'a> {
    graph: &'a mut PropertyGraph,
    db_id_index: &'a mut DbIdIndex,
}

impl<'a> GraphOps<'a> {
    pub fn new(graph: &'a mut PropertyGraph, db_id_index: &'a mut DbIdIndex) -> Self {
        Self { graph, db_id_index }
    }

    /// Add a vertex node and index it.
    pub fn add_vertex(&mut self, node: VertexNode) -> NodeIndex {
        let db_id = node.db_id;
        let idx = self.graph.add_node(node);
        self.db_id_index.insert(db_id, idx);
        idx
    }

    /// Add an edge between two indexed vertices.
    ///
    /// Returns `None` if either endpoint is unknown.
    pub fn add_edge(&mut self, source_db_id: i64, target_db_id: i64, edge: EdgeWeight) -> Option<EdgeIndex> {
        let source = self.find_by_db_id(source_db_id)?;
        let target = self.find_by_db_id(target_db_id)?;
        Some(self.graph.add_edge(source, target, edge))
    }

    /// Find a node by database ID.
    pub fn find_by_db_id(&self, db_id: i64) -> Option<NodeIndex> {
        self.db_id_index.get(&db_id).copied()
    }

    /// Vertex data of a node.
    pub fn vertex(&self, idx: NodeIndex) -> Option<&VertexNode> {
        self.graph.node_weight(idx)
    }

    /// Edge data of an edge.
    pub fn edge(&self, idx: EdgeIndex) -> Option<&EdgeWeight> {
        self.graph.edge_weight(idx)
    }

    /// Nodes carrying `labels` whose properties satisfy every constraint map.
    pub fn find_vertices(&self, labels: &[String], constraints: &[&PropertyMap]) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|idx| {
                self.graph.node_weight(*idx).map_or(false, |node| {
                    node.has_labels(labels)
                        && constraints.iter().all(|c| matches(&node.properties, c))
                })
            })
            .collect()
    }

    /// An existing edge `source -> target` of the given type whose properties
    /// contain `properties`.
    pub fn find_edge(
        &self,
        source: NodeIndex,
        target: NodeIndex,
        edge_type: &str,
        properties: &PropertyMap,
    ) -> Option<EdgeIndex> {
        self.graph
            .edges_connecting(source, target)
            .find(|e| e.weight().edge_type == edge_type && matches(&e.weight().properties, properties))
            .map(|e| e.id())
    }

    /// Edges matching a request, in either orientation. Each edge is
    /// reported once.
    pub fn find_edges(&self, request: &EdgeQuery) -> Vec<EdgeIndex> {
        let endpoint_matches = |idx: NodeIndex, labels: &[String], selectors: &PropertyMap, filters: &PropertyMap| {
            self.graph.node_weight(idx).map_or(false, |node| {
                node.has_labels(labels)
                    && matches(&node.properties, selectors)
                    && matches(&node.properties, filters)
            })
        };

        self.graph
            .edge_references()
            .filter(|e| {
                let weight = e.weight();
                weight.edge_type == request.label
                    && matches(&weight.properties, &request.selectors)
                    && matches(&weight.properties, &request.filters)
            })
            .filter(|e| {
                let oriented = |start: NodeIndex, end: NodeIndex| {
                    endpoint_matches(start, &request.start_labels, &request.start_selectors, &request.start_filters)
                        && endpoint_matches(end, &request.end_labels, &request.end_selectors, &request.end_filters)
                };
                oriented(e.source(), e.target()) || oriented(e.target(), e.source())
            })
            .map(|e| e.id())
            .collect()
    }

    /// Materialize a node as a [`Vertex`].
    pub fn to_vertex(&self, idx: NodeIndex) -> Option<Vertex> {
        self.graph.node_weight(idx).map(VertexNode::to_vertex)
    }

    /// Materialize an edge. Endpoint vertices are attached in complete mode.
    pub fn to_edge(&self, idx: EdgeIndex, mode: EdgeFetchMode) -> Option<Edge> {
        let weight = self.graph.edge_weight(idx)?;
        let (source, target) = self.graph.edge_endpoints(idx)?;
        let source = self.graph.node_weight(source)?;
        let target = self.graph.node_weight(target)?;

        let edge = Edge::new(weight.edge_type.clone())
            .with_id(weight.db_id)
            .with_properties(weight.properties.clone());
        Some(match mode {
            EdgeFetchMode::VertexIds => edge.with_endpoint_ids(source.db_id, target.db_id),
            EdgeFetchMode::CompleteVertex => edge
                .with_source(source.to_vertex())
                .with_destination(target.to_vertex()),
        })
    }

    /// Clear all nodes and edges from the graph.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.db_id_index.clear();
    }

    /// Get the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Parse an identifier issued by the embedded store.
pub fn parse_db_id(id: &Identifier) -> Option<i64> {
    id.as_str().parse().ok()
}
