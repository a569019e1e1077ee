//! Conversion between records and graph elements.

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::record::{property_key, GraphRecord, RecordShape};
use crate::error::{GraphError, GraphResult};
use crate::types::{Edge, PropertyMap, Vertex};

/// Maps records to vertices and edges, and back.
pub trait Mapper: Send + Sync {
    /// Map a record to a vertex. When `labels` has no non-empty entry the
    /// record's type name is used as the only label.
    fn to_vertex<T: GraphRecord>(&self, record: &T, labels: &[String]) -> GraphResult<Vertex>;

    /// Map a record to an edge. A missing or empty label falls back to the
    /// record's type name.
    fn to_edge<T: GraphRecord>(&self, record: &T, label: Option<&str>) -> GraphResult<Edge>;

    /// Copy vertex properties into `dest`. Labels are not retained.
    fn from_vertex<T: GraphRecord>(&self, vertex: &Vertex, dest: &mut T) -> GraphResult<()>;

    /// Copy edge properties into `dest`. The edge type is not retained.
    fn from_edge<T: GraphRecord>(&self, edge: &Edge, dest: &mut T) -> GraphResult<()>;
}

/// [`Mapper`] backed by serde.
///
/// Property values are the serialized field values. Nested structs are kept
/// as opaque JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeMapper;

impl SerdeMapper {
    pub fn new() -> Self {
        Self
    }

    fn to_properties<T: GraphRecord>(&self, record: &T) -> GraphResult<(RecordShape, PropertyMap)> {
        let shape = RecordShape::of::<T>()?;
        let tags = T::field_tags();
        shape.check_tags(tags)?;

        let fields = match serde_json::to_value(record)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(GraphError::NotAStruct {
                    type_name: shape.name.to_string(),
                })
            }
        };

        let properties = fields
            .into_iter()
            .map(|(field, value)| (property_key(&field, tags).to_string(), value))
            .collect();
        Ok((shape, properties))
    }

    fn from_properties<T: GraphRecord>(&self, properties: &PropertyMap, dest: &mut T) -> GraphResult<()> {
        let shape = RecordShape::of::<T>()?;
        let tags = T::field_tags();
        shape.check_tags(tags)?;

        let index = FieldIndex::new(&shape, tags);

        let mut current = match serde_json::to_value(&*dest)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(GraphError::NotAStruct {
                    type_name: shape.name.to_string(),
                })
            }
        };

        for (key, value) in properties {
            let field = index.resolve(key).ok_or_else(|| GraphError::UnknownProperty {
                key: key.clone(),
            })?;
            current.insert(field.to_string(), value.clone());
        }

        *dest = decode(shape.name, current)?;
        Ok(())
    }
}

fn decode<T: GraphRecord>(type_name: &str, fields: Map<String, Value>) -> GraphResult<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|source| GraphError::Decode {
        type_name: type_name.to_string(),
        source,
    })
}

/// Lookup from property keys to struct fields.
struct FieldIndex {
    by_name: HashMap<String, &'static str>,
    by_tag: HashMap<&'static str, &'static str>,
}

impl FieldIndex {
    fn new(shape: &RecordShape, tags: &[(&'static str, &'static str)]) -> Self {
        let mut by_name = HashMap::new();
        for field in shape.fields {
            by_name.insert(field.to_string(), *field);
            by_name.entry(field.to_uppercase()).or_insert(*field);
            by_name.entry(field.to_lowercase()).or_insert(*field);
        }
        let by_tag = tags
            .iter()
            .filter(|(_, tag)| !tag.is_empty())
            .map(|(field, tag)| (*tag, *field))
            .collect();
        Self { by_name, by_tag }
    }

    fn resolve(&self, key: &str) -> Option<&'static str> {
        self.by_name
            .get(key)
            .or_else(|| self.by_tag.get(key))
            .or_else(|| self.by_name.get(&key.to_lowercase()))
            .copied()
    }
}

fn vertex_labels(labels: &[String], type_name: &str) -> Vec<String> {
    let explicit: Vec<String> = labels.iter().filter(|l| !l.is_empty()).cloned().collect();
    if explicit.is_empty() {
        vec![type_name.to_string()]
    } else {
        explicit
    }
}

impl Mapper for SerdeMapper {
    fn to_vertex<T: GraphRecord>(&self, record: &T, labels: &[String]) -> GraphResult<Vertex> {
        let (shape, properties) = self.to_properties(record)?;
        Ok(Vertex::new(vertex_labels(labels, shape.name)).with_properties(properties))
    }

    fn to_edge<T: GraphRecord>(&self, record: &T, label: Option<&str>) -> GraphResult<Edge> {
        let (shape, properties) = self.to_properties(record)?;
        let edge_type = match label {
            Some(label) if !label.is_empty() => label,
            _ => shape.name,
        };
        Ok(Edge::new(edge_type).with_properties(properties))
    }

    fn from_vertex<T: GraphRecord>(&self, vertex: &Vertex, dest: &mut T) -> GraphResult<()> {
        self.from_properties(&vertex.properties, dest)
    }

    fn from_edge<T: GraphRecord>(&self, edge: &Edge, dest: &mut T) -> GraphResult<()> {
        self.from_properties(&edge.properties, dest)
    }
}
