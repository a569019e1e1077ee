//! Core traits for omgraph backends.

mod connection;

pub use connection::*;
