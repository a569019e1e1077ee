//! Core types for omgraph.

mod element;
mod query;

pub use element::*;
pub use query::*;
