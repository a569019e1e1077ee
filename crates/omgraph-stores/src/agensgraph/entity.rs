//! Parsing of AgensGraph entity text.
//!
//! AgensGraph returns graph entities as text columns:
//! - vertex: `Person[3.1]{"name": "Tom"}`
//! - edge: `knows[4.1][3.1,3.2]{"since": 1990}`
//!
//! Graph ids have the form `<label id>.<local id>`.

use once_cell::sync::Lazy;
use regex::Regex;

use omgraph_core::error::{GraphError, GraphResult};
use omgraph_core::types::{Edge, Identifier, PropertyMap, Vertex};

static VERTEX_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<label>[^\[\]]+)\[(?P<id>\d+\.\d+)\](?P<props>\{.*\})$").unwrap()
});

static EDGE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<label>[^\[\]]+)\[(?P<id>\d+\.\d+)\]\[(?P<start>\d+\.\d+),(?P<end>\d+\.\d+)\](?P<props>\{.*\})$",
    )
    .unwrap()
});

static GRAPH_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Parse a vertex column.
pub fn parse_vertex(text: &str) -> GraphResult<Vertex> {
    let caps = VERTEX_TEXT
        .captures(text.trim())
        .ok_or_else(|| GraphError::unexpected_result(format!("not an AgensGraph vertex: {}", text)))?;

    Ok(Vertex::new([&caps["label"]])
        .with_id(Identifier::new(&caps["id"]))
        .with_properties(parse_properties(&caps["props"])?))
}

/// Parse an edge column. Only endpoint ids are available from the text.
pub fn parse_edge(text: &str) -> GraphResult<Edge> {
    let caps = EDGE_TEXT
        .captures(text.trim())
        .ok_or_else(|| GraphError::unexpected_result(format!("not an AgensGraph edge: {}", text)))?;

    Ok(Edge::new(&caps["label"])
        .with_id(Identifier::new(&caps["id"]))
        .with_endpoint_ids(Identifier::new(&caps["start"]), Identifier::new(&caps["end"]))
        .with_properties(parse_properties(&caps["props"])?))
}

/// Whether `name` can be used as a graph path without quoting.
pub fn is_valid_graph_name(name: &str) -> bool {
    GRAPH_NAME.is_match(name)
}

fn parse_properties(text: &str) -> GraphResult<PropertyMap> {
    serde_json::from_str(text).map_err(|e| {
        GraphError::unexpected_result(format!("invalid AgensGraph properties {}: {}", text, e))
    })
}
