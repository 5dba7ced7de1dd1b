//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the pipeline database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- URLs awaiting fetch, one per (source, normalized path)
CREATE TABLE IF NOT EXISTS frontier (
    source TEXT NOT NULL,
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    queued_at TEXT NOT NULL,
    PRIMARY KEY (source, id)
);

CREATE INDEX IF NOT EXISTS idx_frontier_source ON frontier(source);

-- Fetched pages awaiting extraction; the same URL may appear twice
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    html TEXT NOT NULL,
    source TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);

-- Finalized product records
CREATE TABLE IF NOT EXISTS catalog (
    source TEXT NOT NULL,
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    rating REAL NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL,
    product_id TEXT NOT NULL DEFAULT '',
    images TEXT NOT NULL DEFAULT '[]',
    slug TEXT NOT NULL,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (source, id)
);

CREATE INDEX IF NOT EXISTS idx_catalog_slug ON catalog(slug);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
