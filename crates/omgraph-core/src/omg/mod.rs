//! Object-to-graph mapping.
//!
//! Domain structs implement [`GraphRecord`] (usually through
//! [`graph_record!`](crate::graph_record)) to be converted to vertices and
//! edges, and [`GraphObject`] to be persisted through [`GenericStore`].

mod mapper;
mod object;
mod record;
mod store;

pub use mapper::{Mapper, SerdeMapper};
pub use object::{GraphObject, GraphObjectKind, VertexRelation};
pub use record::{GraphRecord, RecordShape};
pub use store::{GenericStore, Persisted};
