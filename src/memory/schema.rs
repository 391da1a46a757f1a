//! SQLite schema and migrations for persisted graphs.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> SqliteResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        apply_v1_schema(conn)?;
    }

    Ok(())
}

/// Apply version 1 schema.
fn apply_v1_schema(conn: &Connection) -> SqliteResult<()> {
    // Timestamps are RFC 3339 with nanoseconds; data and metadata are JSON objects
    conn.execute(
        "CREATE TABLE IF NOT EXISTS nodes (
            id TEXT PRIMARY KEY,
            node_type TEXT NOT NULL,
            data TEXT NOT NULL DEFAULT '{}',
            confidence REAL NOT NULL,
            created_at TEXT NOT NULL,
            last_accessed TEXT NOT NULL,
            memory_strength REAL NOT NULL,
            persistent INTEGER NOT NULL DEFAULT 0,
            metadata TEXT NOT NULL DEFAULT '{}'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS edges (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            target TEXT NOT NULL,
            relation TEXT NOT NULL,
            strength REAL NOT NULL,
            emotional_charge REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL,
            last_used TEXT NOT NULL,
            last_decayed TEXT,
            pending_reinforcement REAL,
            metadata TEXT NOT NULL DEFAULT '{}',
            FOREIGN KEY (source) REFERENCES nodes(id) ON DELETE CASCADE,
            FOREIGN KEY (target) REFERENCES nodes(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(node_type)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_edges_strength ON edges(strength)",
        [],
    )?;

    conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;

    Ok(())
}

/// Get the current schema version.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
}

/// Check if the schema is initialized.
pub fn is_initialized(conn: &Connection) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('nodes', 'edges')",
        [],
        |row| row.get::<_, i32>(0),
    )
    .map(|count| count == 2)
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!is_initialized(&conn));

        initialize_schema(&conn).unwrap();

        assert!(is_initialized(&conn));
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_idempotent_initialization() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_edges_cascade_with_nodes() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO nodes
                (id, node_type, confidence, created_at, last_accessed, memory_strength)
                VALUES ('a', 't', 1.0, 'x', 'x', 3600.0), ('b', 't', 1.0, 'x', 'x', 3600.0);
             INSERT INTO edges (id, source, target, relation, strength, created_at, last_used)
                VALUES ('e', 'a', 'b', 'supports', 0.5, 'x', 'x');
             DELETE FROM nodes WHERE id = 'b';",
        )
        .unwrap();

        let edges: i32 = conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .unwrap();
        assert_eq!(edges, 0);
    }
}
