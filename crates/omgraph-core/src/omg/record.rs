//! Records that can be mapped to and from graph elements.
//!
//! A record is any struct that serde can serialize and deserialize. Its
//! type name and field list are read through a probing deserializer, so no
//! derive beyond serde's own is required.

use serde::de::{self, DeserializeOwned, Visitor};
use serde::{forward_to_deserialize_any, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{GraphError, GraphResult};

/// A struct that can be persisted as a vertex or edge.
///
/// `field_tags` returns `(field, tag)` pairs. A non-empty tag replaces the
/// field name as the property key. Field names are the serialized names,
/// i.e. after any `#[serde(rename)]`.
///
/// Use [`graph_record!`](crate::graph_record) to implement it.
pub trait GraphRecord: Serialize + DeserializeOwned {
    fn field_tags() -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

impl<T: GraphRecord> GraphRecord for Box<T> {
    fn field_tags() -> &'static [(&'static str, &'static str)] {
        T::field_tags()
    }
}

/// Implement [`GraphRecord`] for a type, optionally with field tags.
///
/// ```
/// use omgraph_core::graph_record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Default)]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// graph_record!(Person { name => "fullName" });
/// ```
#[macro_export]
macro_rules! graph_record {
    ($ty:ty { $($field:ident => $tag:literal),* $(,)? }) => {
        impl $crate::omg::GraphRecord for $ty {
            fn field_tags() -> &'static [(&'static str, &'static str)] {
                &[$((stringify!($field), $tag)),*]
            }
        }
    };
    ($ty:ty) => {
        impl $crate::omg::GraphRecord for $ty {}
    };
}

/// Type name and serialized field names of a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

impl RecordShape {
    /// Read the shape of `T`. Fails with [`GraphError::NotAStruct`] for any
    /// type serde does not deserialize as a struct.
    pub fn of<T: DeserializeOwned>() -> GraphResult<Self> {
        let mut captured = None;
        // The probe always errors out once it has seen the struct.
        let _ = T::deserialize(ShapeProbe {
            captured: &mut captured,
        });
        captured.ok_or_else(|| GraphError::NotAStruct {
            type_name: std::any::type_name::<T>().to_string(),
        })
    }

    /// Whether the struct declares the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    /// Check that every tagged field exists on the struct and that no two
    /// fields end up under the same property key.
    pub(crate) fn check_tags(&self, tags: &[(&str, &str)]) -> GraphResult<()> {
        for (field, tag) in tags {
            if !self.has_field(field) {
                return Err(GraphError::UnknownField {
                    type_name: self.name.to_string(),
                    field: field.to_string(),
                    tag: tag.to_string(),
                });
            }
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for &field in self.fields {
            let key = property_key(field, tags);
            if let Some(first) = owners.insert(key, field) {
                return Err(GraphError::DuplicateProperty {
                    type_name: self.name.to_string(),
                    key: key.to_string(),
                    first: first.to_string(),
                    second: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Property key of `field`: its first non-empty tag, else the field name.
pub(crate) fn property_key<'a>(field: &'a str, tags: &[(&str, &'a str)]) -> &'a str {
    tags.iter()
        .find(|(f, tag)| *f == field && !tag.is_empty())
        .map_or(field, |(_, tag)| *tag)
}

struct ShapeProbe<'a> {
    captured: &'a mut Option<RecordShape>,
}

#[derive(Debug)]
struct ProbeStop;

impl fmt::Display for ProbeStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape probe stopped")
    }
}

impl std::error::Error for ProbeStop {}

impl de::Error for ProbeStop {
    fn custom<M: fmt::Display>(_msg: M) -> Self {
        ProbeStop
    }
}

impl<'de, 'a> de::Deserializer<'de> for ShapeProbe<'a> {
    type Error = ProbeStop;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeStop)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.captured = Some(RecordShape { name, fields });
        Err(ProbeStop)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Serialize, Deserialize, Default)]
    struct Person {
        name: String,
        age: i32,
    }

    #[derive(Serialize, Deserialize, Default)]
    #[serde(rename = "Employee")]
    struct Staff {
        #[serde(rename = "empId")]
        id: String,
    }

    #[test]
    fn test_shape_of_struct() {
        let shape = RecordShape::of::<Person>().unwrap();
        assert_eq!(shape.name, "Person");
        assert_eq!(shape.fields, &["name", "age"]);
    }

    #[test]
    fn test_shape_through_box() {
        let shape = RecordShape::of::<Box<Person>>().unwrap();
        assert_eq!(shape.name, "Person");
    }

    #[test]
    fn test_shape_honours_serde_renames() {
        let shape = RecordShape::of::<Staff>().unwrap();
        assert_eq!(shape.name, "Employee");
        assert!(shape.has_field("empId"));
        assert!(!shape.has_field("id"));
    }

    #[test]
    fn test_non_struct_has_no_shape() {
        assert!(matches!(
            RecordShape::of::<i32>(),
            Err(GraphError::NotAStruct { .. })
        ));
        assert!(RecordShape::of::<HashMap<String, i32>>().is_err());
        assert!(RecordShape::of::<Vec<String>>().is_err());
    }

    #[test]
    fn test_check_tags() {
        let shape = RecordShape::of::<Person>().unwrap();
        assert!(shape.check_tags(&[("name", "fullName")]).is_ok());
        let err = shape.check_tags(&[("nickname", "nick")]).unwrap_err();
        assert!(matches!(err, GraphError::UnknownField { ref field, .. } if field == "nickname"));
    }

    #[test]
    fn test_check_tags_rejects_shared_keys() {
        let shape = RecordShape::of::<Person>().unwrap();

        // A tag naming another field.
        let err = shape.check_tags(&[("age", "name")]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::MapDuplicateProperty);
        assert!(matches!(
            err,
            GraphError::DuplicateProperty { ref key, ref first, ref second, .. }
                if key == "name" && first == "name" && second == "age"
        ));

        // Two fields with one tag.
        let err = shape
            .check_tags(&[("name", "label"), ("age", "label")])
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateProperty { ref key, .. } if key == "label"));

        // Swapping names is unambiguous.
        assert!(shape.check_tags(&[("name", "age"), ("age", "name")]).is_ok());
    }
}
