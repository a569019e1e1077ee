//! Rendering of property maps into Cypher fragments.

use serde_json::Value;

use crate::types::PropertyMap;

/// Render a property map as an inline selector, e.g. `{name:'Tom',age: 12}`.
///
/// String values are single-quoted; everything else uses its JSON text.
/// An empty map renders as the empty string.
pub fn render_selector(selector: &PropertyMap) -> String {
    if selector.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = selector
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}:'{}'", key, escape(s)),
            other => format!("{}: {}", key, other),
        })
        .collect();
    format!("{{{}}}", pairs.join(","))
}

/// Render the filters of one variable as `var.key=value` conjuncts joined by `AND`.
pub fn render_predicate(var: &str, filters: &PropertyMap) -> String {
    filters
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}.{}='{}'", var, key, escape(s)),
            other => format!("{}.{}={}", var, key, other),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Render the filters of several variables as a single ` WHERE ...` clause.
///
/// Groups with no filters are skipped. Returns the empty string when no
/// group contributes a conjunct.
pub fn render_where(groups: &[(&str, &PropertyMap)]) -> String {
    let predicates: Vec<String> = groups
        .iter()
        .filter(|(_, filters)| !filters.is_empty())
        .map(|(var, filters)| render_predicate(var, filters))
        .collect();
    if predicates.is_empty() {
        return String::new();
    }
    format!(" WHERE {}", predicates.join(" AND "))
}

/// Render labels as `:A:B`.
pub fn render_labels(labels: &[String]) -> String {
    labels.iter().map(|l| format!(":{}", l)).collect()
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
