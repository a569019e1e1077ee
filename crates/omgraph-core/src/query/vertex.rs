//! Builder for single-vertex Cypher queries.

use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::types::{PropertyMap, QueryMode, WriteMode};

use super::render::{render_labels, render_selector, render_where};
use super::{check_labels, non_empty, resolve_var};

/// Builds `MATCH`, `MERGE` or `CREATE` queries for a single vertex.
///
/// When several labels are set, the pattern matches a node carrying all of
/// them. Selectors and filters accumulate across calls.
#[derive(Debug, Clone, Default)]
pub struct VertexQueryBuilder {
    query_mode: QueryMode,
    labels: Vec<String>,
    var_name: Option<String>,
    selector: PropertyMap,
    filters: PropertyMap,
    write_mode: WriteMode,
}

impl VertexQueryBuilder {
    /// Create a new builder in read mode with merge write semantics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query mode.
    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.query_mode = mode;
        self
    }

    /// Replace the vertex labels.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Append a single vertex label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Bind the vertex to an explicit variable name. An empty name is ignored.
    pub fn var_name(mut self, name: impl Into<String>) -> Self {
        self.var_name = non_empty(name.into());
        self
    }

    /// Add selector entries, copied from the given map.
    pub fn selector(mut self, selector: &PropertyMap) -> Self {
        self.selector
            .extend(selector.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add filter entries, copied from the given map.
    pub fn filters(mut self, filters: &PropertyMap) -> Self {
        self.filters
            .extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set the write mode used when the query mode is [`QueryMode::Write`].
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Build the query text.
    pub fn build(self) -> GraphResult<String> {
        self.validate()?;

        let operation = match (self.query_mode, self.write_mode) {
            (QueryMode::Read, _) => "MATCH",
            (QueryMode::Write, WriteMode::Merge) => "MERGE",
            (QueryMode::Write, WriteMode::Create) => "CREATE",
        };

        let var = resolve_var(self.var_name.as_deref(), &self.labels, &[]);
        let predicate = render_where(&[(var.as_str(), &self.filters)]);

        let query = format!(
            "{} ({}{}{}) {} return {}",
            operation,
            var,
            render_labels(&self.labels),
            render_selector(&self.selector),
            predicate,
            var
        );
        tracing::debug!(query = %query, "built vertex query");
        Ok(query)
    }

    fn validate(&self) -> GraphResult<()> {
        if self.labels.is_empty() {
            return Err(GraphError::validation(
                ErrorCode::ValMissingLabel,
                "no vertex labels specified in the query",
            ));
        }
        check_labels(&self.labels, "vertex")
    }
}
