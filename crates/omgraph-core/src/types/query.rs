//! Query modes, results and structured edge requests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::PropertyMap;

/// Whether a query reads from or writes to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Read,
    Write,
}

/// How a write query introduces vertices.
///
/// Some backends refuse to create unknown labels through `MERGE`; those
/// callers must force `CREATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Match-or-create.
    #[default]
    Merge,
    /// Unconditional creation.
    Create,
}

/// Level of detail returned for the endpoints of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeFetchMode {
    /// Only the identifiers of the start and end vertices.
    #[default]
    VertexIds,
    /// Fully materialized start and end vertices.
    CompleteVertex,
}

/// A single row of a query result.
pub type Row = HashMap<String, serde_json::Value>;

/// Result of a raw query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Structured request for edges of one type between two kinds of vertices.
///
/// Selectors are embedded in the match pattern; filters are applied as a
/// post-match predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeQuery {
    pub start_labels: Vec<String>,
    pub end_labels: Vec<String>,
    pub label: String,
    pub start_selectors: PropertyMap,
    pub end_selectors: PropertyMap,
    pub selectors: PropertyMap,
    pub start_filters: PropertyMap,
    pub end_filters: PropertyMap,
    pub filters: PropertyMap,
    pub params: PropertyMap,
    pub fetch_mode: EdgeFetchMode,
}

impl EdgeQuery {
    /// Create a request for edges of the given type.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Set the start vertex labels.
    pub fn start_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the end vertex labels.
    pub fn end_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.end_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the start vertex selectors.
    pub fn start_selectors(mut self, selectors: PropertyMap) -> Self {
        self.start_selectors = selectors;
        self
    }

    /// Set the end vertex selectors.
    pub fn end_selectors(mut self, selectors: PropertyMap) -> Self {
        self.end_selectors = selectors;
        self
    }

    /// Set the edge selectors.
    pub fn selectors(mut self, selectors: PropertyMap) -> Self {
        self.selectors = selectors;
        self
    }

    /// Set the start vertex filters.
    pub fn start_filters(mut self, filters: PropertyMap) -> Self {
        self.start_filters = filters;
        self
    }

    /// Set the end vertex filters.
    pub fn end_filters(mut self, filters: PropertyMap) -> Self {
        self.end_filters = filters;
        self
    }

    /// Set the edge filters.
    pub fn filters(mut self, filters: PropertyMap) -> Self {
        self.filters = filters;
        self
    }

    /// Set the query parameters.
    pub fn params(mut self, params: PropertyMap) -> Self {
        self.params = params;
        self
    }

    /// Set the fetch mode.
    pub fn fetch_mode(mut self, fetch_mode: EdgeFetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }
}
