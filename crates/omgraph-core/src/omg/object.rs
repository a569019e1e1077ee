//! Domain objects persisted through the generic store.

use serde::{Deserialize, Serialize};

/// Whether a domain object is stored as a vertex or a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphObjectKind {
    Vertex,
    Relationship,
}

/// A user type that can be persisted through [`GenericStore`](super::GenericStore).
pub trait GraphObject {
    /// Label used for the vertex, or type used for the relationship.
    fn label(&self) -> String;

    /// How the object is stored.
    fn kind(&self) -> GraphObjectKind;
}

impl<T: GraphObject + ?Sized> GraphObject for Box<T> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn kind(&self) -> GraphObjectKind {
        (**self).kind()
    }
}

/// A source vertex, optionally connected to a destination vertex by a
/// relationship.
///
/// With only a source present the value describes an isolated vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRelation<S, R, D> {
    pub source: Option<S>,
    pub relationship: Option<R>,
    pub destination: Option<D>,
}

impl<S, R, D> VertexRelation<S, R, D> {
    /// A source connected to a destination.
    pub fn new(source: S, relationship: R, destination: D) -> Self {
        Self {
            source: Some(source),
            relationship: Some(relationship),
            destination: Some(destination),
        }
    }

    /// An isolated vertex.
    pub fn isolated(source: S) -> Self {
        Self {
            source: Some(source),
            relationship: None,
            destination: None,
        }
    }
}

impl<S, R, D> Default for VertexRelation<S, R, D> {
    fn default() -> Self {
        Self {
            source: None,
            relationship: None,
            destination: None,
        }
    }
}
