//! Cypher query construction.
//!
//! [`VertexQueryBuilder`] and [`EdgeQueryBuilder`] compile structured
//! selection requests into Cypher text. Selectors are embedded in the match
//! pattern and therefore act as the identity of a `MERGE`; filters are only
//! rendered as a post-match `WHERE` predicate.
//!
//! # Example
//!
//! ```
//! use omgraph_core::query::VertexQueryBuilder;
//! use omgraph_core::types::{PropertyMap, QueryMode};
//!
//! let mut selector = PropertyMap::new();
//! selector.insert("name".into(), "Tom".into());
//!
//! let query = VertexQueryBuilder::new()
//!     .query_mode(QueryMode::Read)
//!     .label("Person")
//!     .selector(&selector)
//!     .build()
//!     .unwrap();
//! assert_eq!(query, "MATCH (pe:Person{name:'Tom'})  return pe");
//! ```

mod edge;
pub mod render;
mod vertex;

pub use edge::EdgeQueryBuilder;
pub use vertex::VertexQueryBuilder;

use crate::error::{ErrorCode, GraphError, GraphResult};

/// Derive a variable name from a label: its first two characters, lower-cased.
pub(crate) fn derive_var(label: &str) -> String {
    label.chars().take(2).collect::<String>().to_lowercase()
}

/// Resolve the variable bound to one site of a pattern.
///
/// An explicit name is used verbatim. A derived name that is already bound
/// elsewhere in the pattern gets a numeric suffix.
pub(crate) fn resolve_var(explicit: Option<&str>, labels: &[String], bound: &[&str]) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }
    let base = labels.first().map(|l| derive_var(l)).unwrap_or_default();
    if !bound.contains(&base.as_str()) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{}{}", base, n);
        if !bound.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

pub(crate) fn check_labels(labels: &[String], what: &str) -> GraphResult<()> {
    if labels.iter().any(|l| l.is_empty()) {
        return Err(GraphError::validation(
            ErrorCode::ValMissingLabel,
            format!("empty {} label specified in the query", what),
        ));
    }
    Ok(())
}

pub(crate) fn non_empty(name: String) -> Option<String> {
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
