//! Vertex and edge types shared by every backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Property bag of a vertex or edge, also used for selectors and filters.
///
/// Iteration order is unspecified.
pub type PropertyMap = HashMap<String, serde_json::Value>;

/// Backend-assigned identifier of a graph element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier from any displayable backend id.
    pub fn new(value: impl fmt::Display) -> Self {
        Self(value.to_string())
    }

    /// The identifier as it was reported by the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! identifier_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Identifier {
            fn from(value: $t) -> Self {
                Self::new(value)
            }
        })*
    };
}

identifier_from_int!(i32, i64, u32, u64, usize);

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Common accessors of vertices and edges.
pub trait GraphElement {
    /// Identifier of the element as present in the backing database.
    fn id(&self) -> Option<&Identifier>;

    /// Labels of the element. An edge reports its type as its only label.
    fn labels(&self) -> Vec<&str>;

    /// Properties of the element.
    fn properties(&self) -> &PropertyMap;
}

/// A vertex within the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Identifier, `None` until the vertex is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    /// One or more labels.
    pub labels: Vec<String>,
    /// Vertex properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Vertex {
    /// Create a vertex with the given labels and no properties.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            labels: labels.into_iter().map(Into::into).collect(),
            properties: PropertyMap::new(),
        }
    }

    /// Set the identifier.
    pub fn with_id(mut self, id: impl Into<Identifier>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace the properties.
    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }

    /// Whether the vertex carries every given label.
    pub fn has_labels(&self, labels: &[String]) -> bool {
        labels.iter().all(|l| self.labels.contains(l))
    }
}

impl GraphElement for Vertex {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn labels(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }

    fn properties(&self) -> &PropertyMap {
        &self.properties
    }
}

/// A typed relationship between two vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier, `None` until the edge is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    /// Relationship type.
    pub edge_type: String,
    /// Identifier of the source vertex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<Identifier>,
    /// Source vertex, present only when fetched with complete vertices
    /// or when supplied for persistence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Box<Vertex>>,
    /// Identifier of the destination vertex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<Identifier>,
    /// Destination vertex, see [`Edge::source`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Box<Vertex>>,
    /// Edge properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Edge {
    /// Create an edge of the given type with no endpoints.
    pub fn new(edge_type: impl Into<String>) -> Self {
        Self {
            edge_type: edge_type.into(),
            ..Default::default()
        }
    }

    /// Set the identifier.
    pub fn with_id(mut self, id: impl Into<Identifier>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach the source vertex, copying its id.
    pub fn with_source(mut self, vertex: Vertex) -> Self {
        self.source_id = vertex.id.clone();
        self.source = Some(Box::new(vertex));
        self
    }

    /// Attach the destination vertex, copying its id.
    pub fn with_destination(mut self, vertex: Vertex) -> Self {
        self.destination_id = vertex.id.clone();
        self.destination = Some(Box::new(vertex));
        self
    }

    /// Set the endpoint identifiers without materialized vertices.
    pub fn with_endpoint_ids(mut self, source: impl Into<Identifier>, destination: impl Into<Identifier>) -> Self {
        self.source_id = Some(source.into());
        self.destination_id = Some(destination.into());
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace the properties.
    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }
}

impl GraphElement for Edge {
    fn id(&self) -> Option<&Identifier> {
        self.id.as_ref()
    }

    fn labels(&self) -> Vec<&str> {
        vec![self.edge_type.as_str()]
    }

    fn properties(&self) -> &PropertyMap {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_reports_type_as_label() {
        let edge = Edge::new("KNOWS").with_property("since", 1990);
        assert_eq!(GraphElement::labels(&edge), vec!["KNOWS"]);
        assert_eq!(edge.properties["since"], serde_json::json!(1990));
    }

    #[test]
    fn test_with_source_copies_id() {
        let source = Vertex::new(["Person"]).with_id(7);
        let edge = Edge::new("KNOWS").with_source(source);
        assert_eq!(edge.source_id, Some(Identifier::new(7)));
        assert!(edge.source.is_some());
        assert!(edge.destination_id.is_none());
    }

    #[test]
    fn test_has_labels() {
        let vertex = Vertex::new(["Person", "Employee"]);
        assert!(vertex.has_labels(&["Employee".to_string()]));
        assert!(!vertex.has_labels(&["City".to_string()]));
        assert!(vertex.has_labels(&[]));
    }
}
