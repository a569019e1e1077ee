//! Persistence of domain objects through a [`Connection`].

use std::sync::Arc;

use super::mapper::{Mapper, SerdeMapper};
use super::object::{GraphObject, GraphObjectKind, VertexRelation};
use super::record::GraphRecord;
use crate::error::{ErrorCode, GraphError, GraphResult};
use crate::traits::Connection;
use crate::types::{Edge, EdgeFetchMode, EdgeQuery, PropertyMap, Vertex};

/// What [`GenericStore::persist_relation`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    /// An isolated vertex.
    Vertex(Vertex),
    /// A relationship together with both endpoints.
    Edge(Edge),
}

/// Maps domain objects with a [`Mapper`] and stores them through a
/// [`Connection`].
pub struct GenericStore<M: Mapper = SerdeMapper> {
    connection: Arc<dyn Connection>,
    mapper: M,
}

impl GenericStore<SerdeMapper> {
    /// Create a store using the serde mapper.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self::with_mapper(connection, SerdeMapper)
    }
}

impl<M: Mapper> GenericStore<M> {
    /// Create a store using a custom mapper.
    pub fn with_mapper(connection: Arc<dyn Connection>, mapper: M) -> Self {
        Self { connection, mapper }
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Persist a vertex object and return the stored vertex, id included.
    pub async fn persist_vertex<T>(&self, object: &T) -> GraphResult<Vertex>
    where
        T: GraphRecord + GraphObject,
    {
        expect_kind(object, GraphObjectKind::Vertex, "object")?;
        let mut vertex = self.vertex_of(object)?;
        self.connection.store_vertex(&mut vertex).await?;
        Ok(vertex)
    }

    /// Read every vertex matching the non-null properties of `example`.
    pub async fn read_vertex<T>(&self, example: &T) -> GraphResult<Vec<T>>
    where
        T: GraphRecord + GraphObject + Default,
    {
        expect_kind(example, GraphObjectKind::Vertex, "object")?;
        let label = example.label();
        let selectors = self.selectors(example, &label)?;
        let empty = PropertyMap::new();

        let vertices = self
            .connection
            .query_vertex(&label, &selectors, &empty, &empty)
            .await?;

        vertices
            .iter()
            .map(|vertex| {
                let mut object = T::default();
                self.mapper.from_vertex(vertex, &mut object)?;
                Ok(object)
            })
            .collect()
    }

    /// Persist an isolated vertex, or a relationship with both endpoints.
    ///
    /// The relationship and destination must be both present or both absent.
    /// Shapes and kinds are checked before the backend is called.
    pub async fn persist_relation<S, R, D>(
        &self,
        relation: &VertexRelation<S, R, D>,
    ) -> GraphResult<Persisted>
    where
        S: GraphRecord + GraphObject,
        R: GraphRecord + GraphObject,
        D: GraphRecord + GraphObject,
    {
        let source = relation.source.as_ref().ok_or_else(|| {
            GraphError::validation(ErrorCode::ValInvalidRelation, "source vertex must be specified")
        })?;
        expect_kind(source, GraphObjectKind::Vertex, "source")?;

        match (&relation.relationship, &relation.destination) {
            (None, None) => {
                let mut vertex = self.vertex_of(source)?;
                self.connection.store_vertex(&mut vertex).await?;
                Ok(Persisted::Vertex(vertex))
            }
            (Some(relationship), Some(destination)) => {
                expect_kind(relationship, GraphObjectKind::Relationship, "relationship")?;
                expect_kind(destination, GraphObjectKind::Vertex, "destination")?;

                let source = self.vertex_of(source)?;
                let destination = self.vertex_of(destination)?;
                let mut edge = self
                    .mapper
                    .to_edge(relationship, Some(relationship.label().as_str()))?;
                edge.properties = non_null(edge.properties);
                let mut edge = edge
                    .with_source(source)
                    .with_destination(destination);
                self.connection.store_edge(&mut edge).await?;
                Ok(Persisted::Edge(edge))
            }
            (None, Some(_)) => Err(GraphError::validation(
                ErrorCode::ValInvalidRelation,
                "relationship must be specified when a destination vertex is present",
            )),
            (Some(_), None) => Err(GraphError::validation(
                ErrorCode::ValInvalidRelation,
                "destination vertex must be specified when a relationship is present",
            )),
        }
    }

    /// Read relationships matching the non-null properties of all three parts.
    ///
    /// Unlike [`persist_relation`](Self::persist_relation), an isolated vertex
    /// is not accepted here: source, relationship and destination are all
    /// required.
    pub async fn read_relation<S, R, D>(
        &self,
        relation: &VertexRelation<S, R, D>,
    ) -> GraphResult<Vec<VertexRelation<S, R, D>>>
    where
        S: GraphRecord + GraphObject + Default,
        R: GraphRecord + GraphObject + Default,
        D: GraphRecord + GraphObject + Default,
    {
        let (source, relationship, destination) = match (
            &relation.source,
            &relation.relationship,
            &relation.destination,
        ) {
            (Some(s), Some(r), Some(d)) => (s, r, d),
            _ => {
                return Err(GraphError::validation(
                    ErrorCode::ValInvalidRelation,
                    "source, relationship and destination must all be specified",
                ))
            }
        };
        expect_kind(source, GraphObjectKind::Vertex, "source")?;
        expect_kind(relationship, GraphObjectKind::Relationship, "relationship")?;
        expect_kind(destination, GraphObjectKind::Vertex, "destination")?;

        let source_label = source.label();
        let destination_label = destination.label();
        let edge_label = relationship.label();

        let request = EdgeQuery::new(edge_label.clone())
            .start_labels([source_label.clone()])
            .end_labels([destination_label.clone()])
            .start_selectors(self.selectors(source, &source_label)?)
            .end_selectors(self.selectors(destination, &destination_label)?)
            .selectors(self.edge_selectors(relationship, &edge_label)?)
            .fetch_mode(EdgeFetchMode::CompleteVertex);

        let edges = self.connection.query_edge(&request).await?;

        edges
            .iter()
            .map(|edge| {
                let (start, end) = match (edge.source.as_deref(), edge.destination.as_deref()) {
                    (Some(start), Some(end)) => (start, end),
                    _ => {
                        return Err(GraphError::unexpected_result(format!(
                            "edge {} was returned without its endpoints",
                            edge.edge_type
                        )))
                    }
                };
                let mut source = S::default();
                let mut relationship = R::default();
                let mut destination = D::default();
                self.mapper.from_vertex(start, &mut source)?;
                self.mapper.from_edge(edge, &mut relationship)?;
                self.mapper.from_vertex(end, &mut destination)?;
                Ok(VertexRelation::new(source, relationship, destination))
            })
            .collect()
    }

    /// Map a vertex object for writing. Unset fields are left out.
    fn vertex_of<T: GraphRecord + GraphObject>(&self, object: &T) -> GraphResult<Vertex> {
        let mut vertex = self.mapper.to_vertex(object, &[object.label()])?;
        vertex.properties = non_null(vertex.properties);
        Ok(vertex)
    }

    fn selectors<T: GraphRecord>(&self, object: &T, label: &str) -> GraphResult<PropertyMap> {
        let vertex = self.mapper.to_vertex(object, &[label.to_string()])?;
        Ok(non_null(vertex.properties))
    }

    fn edge_selectors<T: GraphRecord>(&self, object: &T, label: &str) -> GraphResult<PropertyMap> {
        let edge = self.mapper.to_edge(object, Some(label))?;
        Ok(non_null(edge.properties))
    }
}

fn non_null(properties: PropertyMap) -> PropertyMap {
    properties.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

fn expect_kind(object: &impl GraphObject, kind: GraphObjectKind, role: &str) -> GraphResult<()> {
    let actual = object.kind();
    if actual != kind {
        return Err(GraphError::validation(
            ErrorCode::ValKindMismatch,
            format!("{} must be a {:?}, got {:?}", role, kind, actual),
        ));
    }
    Ok(())
}
