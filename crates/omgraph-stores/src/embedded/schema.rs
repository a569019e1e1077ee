//! SQLite schema for the embedded graph.
//!
//! Two tables back the in-memory graph:
//! - `vertices`: labels and properties, both stored as JSON text
//! - `edges`: source, target, type and properties

use rusqlite::Connection;

use omgraph_core::error::GraphResult;

use super::sqlite_error;

/// SQL for the vertices table.
pub const CREATE_VERTICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vertices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    labels TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// SQL for the edges table.
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES vertices(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES vertices(id) ON DELETE CASCADE,
    edge_type TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// Index for traversal from source.
pub const CREATE_EDGES_SOURCE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)
"#;

/// Index for traversal to target.
pub const CREATE_EDGES_TARGET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)
"#;

/// Index for edge type filtering.
pub const CREATE_EDGES_TYPE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(edge_type)
"#;

/// Initialize the graph schema. Idempotent.
pub fn init_schema(conn: &Connection) -> GraphResult<()> {
    let statements = [
        "PRAGMA foreign_keys = ON",
        CREATE_VERTICES_TABLE,
        CREATE_EDGES_TABLE,
        CREATE_EDGES_SOURCE_INDEX,
        CREATE_EDGES_TARGET_INDEX,
        CREATE_EDGES_TYPE_INDEX,
    ];
    for statement in statements {
        conn.execute(statement, []).map_err(sqlite_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"vertices".to_string()));
        assert!(tables.contains(&"edges".to_string()));
    }

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='vertices'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_edge_cascade_delete() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute("INSERT INTO vertices (labels) VALUES ('[\"Person\"]')", [])
            .unwrap();
        conn.execute("INSERT INTO vertices (labels) VALUES ('[\"Person\"]')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO edges (source_id, target_id, edge_type) VALUES (1, 2, 'KNOWS')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM vertices WHERE id = 1", []).unwrap();

        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
