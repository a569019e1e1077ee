//! Builder for single-relationship Cypher queries.

use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::types::{EdgeFetchMode, EdgeQuery, PropertyMap, QueryMode};

use super::render::{render_labels, render_selector, render_where};
use super::{check_labels, non_empty, resolve_var};

/// Builds `MATCH` or `MERGE` queries for a relationship between two vertices.
///
/// The fetch mode controls the projection: with [`EdgeFetchMode::VertexIds`]
/// only the relationship is returned, with [`EdgeFetchMode::CompleteVertex`]
/// the start vertex, relationship and end vertex are returned in that order.
///
/// An endpoint may be identified by an explicit variable name alone, which
/// lets the pattern refer to a vertex bound earlier without repeating its
/// labels.
#[derive(Debug, Clone, Default)]
pub struct EdgeQueryBuilder {
    query_mode: QueryMode,
    fetch_mode: EdgeFetchMode,
    start_vertex_labels: Vec<String>,
    start_vertex_var_name: Option<String>,
    end_vertex_labels: Vec<String>,
    end_vertex_var_name: Option<String>,
    labels: Vec<String>,
    var_name: Option<String>,
    start_vertex_selector: PropertyMap,
    end_vertex_selector: PropertyMap,
    selector: PropertyMap,
    start_vertex_filters: PropertyMap,
    end_vertex_filters: PropertyMap,
    filters: PropertyMap,
}

fn merge_into(target: &mut PropertyMap, source: &PropertyMap) {
    target.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
}

impl EdgeQueryBuilder {
    /// Create a new builder in read mode returning vertex ids only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a read builder from a structured edge request.
    pub fn from_request(request: &EdgeQuery) -> Self {
        Self::new()
            .fetch_mode(request.fetch_mode)
            .start_vertex_labels(request.start_labels.iter().cloned())
            .end_vertex_labels(request.end_labels.iter().cloned())
            .label(request.label.clone())
            .start_vertex_selector(&request.start_selectors)
            .end_vertex_selector(&request.end_selectors)
            .selector(&request.selectors)
            .start_vertex_filters(&request.start_filters)
            .end_vertex_filters(&request.end_filters)
            .filters(&request.filters)
    }

    /// Set the query mode.
    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    /// Set the fetch mode.
    pub fn fetch_mode(mut self, mode: EdgeFetchMode) -> Self {
        self.fetch_mode = mode;
        self
    }

    /// Append start vertex labels.
    pub fn start_vertex_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_vertex_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Bind the start vertex to an explicit variable name.
    pub fn start_vertex_var_name(mut self, name: impl Into<String>) -> Self {
        self.start_vertex_var_name = non_empty(name.into());
        self
    }

    /// Append end vertex labels.
    pub fn end_vertex_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.end_vertex_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Bind the end vertex to an explicit variable name.
    pub fn end_vertex_var_name(mut self, name: impl Into<String>) -> Self {
        self.end_vertex_var_name = non_empty(name.into());
        self
    }

    /// Append an edge label. Exactly one label must be present at build time.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Append edge labels.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Bind the relationship to an explicit variable name.
    pub fn var_name(mut self, name: impl Into<String>) -> Self {
        self.var_name = non_empty(name.into());
        self
    }

    /// Add start vertex selector entries.
    pub fn start_vertex_selector(mut self, selector: &PropertyMap) -> Self {
        merge_into(&mut self.start_vertex_selector, selector);
        self
    }

    /// Add end vertex selector entries.
    pub fn end_vertex_selector(mut self, selector: &PropertyMap) -> Self {
        merge_into(&mut self.end_vertex_selector, selector);
        self
    }

    /// Add relationship selector entries.
    pub fn selector(mut self, selector: &PropertyMap) -> Self {
        merge_into(&mut self.selector, selector);
        self
    }

    /// Add start vertex filter entries.
    pub fn start_vertex_filters(mut self, filters: &PropertyMap) -> Self {
        merge_into(&mut self.start_vertex_filters, filters);
        self
    }

    /// Add end vertex filter entries.
    pub fn end_vertex_filters(mut self, filters: &PropertyMap) -> Self {
        merge_into(&mut self.end_vertex_filters, filters);
        self
    }

    /// Add relationship filter entries.
    pub fn filters(mut self, filters: &PropertyMap) -> Self {
        merge_into(&mut self.filters, filters);
        self
    }

    /// Build the query text.
    pub fn build(self) -> GraphResult<String> {
        self.validate()?;

        let operation = match self.query_mode {
            QueryMode::Read => "MATCH",
            QueryMode::Write => "MERGE",
        };

        let start_var = resolve_var(
            self.start_vertex_var_name.as_deref(),
            &self.start_vertex_labels,
            &[],
        );
        let end_var = resolve_var(
            self.end_vertex_var_name.as_deref(),
            &self.end_vertex_labels,
            &[start_var.as_str()],
        );
        let edge_var = resolve_var(
            self.var_name.as_deref(),
            &self.labels,
            &[start_var.as_str(), end_var.as_str()],
        );

        let start = node_pattern(&start_var, &self.start_vertex_labels, &self.start_vertex_selector);
        let end = node_pattern(&end_var, &self.end_vertex_labels, &self.end_vertex_selector);
        let edge = format!(
            "{}{}{}",
            edge_var,
            render_labels(&self.labels),
            render_selector(&self.selector)
        );

        let predicate = render_where(&[
            (start_var.as_str(), &self.start_vertex_filters),
            (end_var.as_str(), &self.end_vertex_filters),
            (edge_var.as_str(), &self.filters),
        ]);

        let projection = match self.fetch_mode {
            EdgeFetchMode::VertexIds => format!("return {}", edge_var),
            EdgeFetchMode::CompleteVertex => {
                format!("return {}, {}, {}", start_var, edge_var, end_var)
            }
        };

        let query = format!(
            "{} {}-[{}]-{} {} {}",
            operation, start, edge, end, predicate, projection
        );
        tracing::debug!(query = %query, "built edge query");
        Ok(query)
    }

    fn validate(&self) -> GraphResult<()> {
        match self.labels.len() {
            0 => {
                return Err(GraphError::validation(
                    ErrorCode::ValMissingLabel,
                    "no edge labels specified in the query",
                ))
            }
            1 => {}
            _ => {
                return Err(GraphError::validation(
                    ErrorCode::ValMultipleEdgeLabels,
                    "multiple edge labels cannot be specified",
                ))
            }
        }
        check_labels(&self.labels, "edge")?;

        if self.start_vertex_labels.is_empty() && self.start_vertex_var_name.is_none() {
            return Err(GraphError::validation(
                ErrorCode::ValMissingEndpoint,
                "either start vertex label or start vertex variable name must be specified",
            ));
        }
        if self.end_vertex_labels.is_empty() && self.end_vertex_var_name.is_none() {
            return Err(GraphError::validation(
                ErrorCode::ValMissingEndpoint,
                "either end vertex label or end vertex variable name must be specified",
            ));
        }
        check_labels(&self.start_vertex_labels, "start vertex")?;
        check_labels(&self.end_vertex_labels, "end vertex")
    }
}

fn node_pattern(var: &str, labels: &[String], selector: &PropertyMap) -> String {
    format!("({}{}{})", var, render_labels(labels), render_selector(selector))
}
