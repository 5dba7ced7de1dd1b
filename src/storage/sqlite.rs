//! SQLite storage implementation
//!
//! A single connection behind a mutex backs all three collections. Every
//! trait method is one short critical section, so no caller ever holds a
//! record in memory across somebody else's mutation.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    CatalogStore, DocumentStore, EnqueueError, FrontierStore, StorageError, StorageResult,
};
use crate::storage::{CrawledDocument, FrontierEntry, ProductRecord};
use crate::url::frontier_id;
use chrono::Utc;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database or create the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn count(conn: &Connection, table: &str, source: Option<&str>) -> StorageResult<u64> {
    let count: i64 = match source {
        Some(source) => conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE source = ?1", table),
            params![source],
            |row| row.get(0),
        )?,
        None => conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?,
    };
    Ok(count as u64)
}

fn frontier_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FrontierEntry> {
    Ok(FrontierEntry {
        source: row.get(0)?,
        id: row.get(1)?,
        url: row.get(2)?,
    })
}

impl FrontierStore for SqliteStorage {
    fn enqueue(&self, url: &str, source: &str) -> Result<FrontierEntry, EnqueueError> {
        let id = frontier_id(url)?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StorageError::from)?;

        let indexed: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM catalog WHERE source = ?1 AND id = ?2)",
                params![source, id],
                |row| row.get(0),
            )
            .map_err(StorageError::from)?;
        if indexed {
            return Err(EnqueueError::AlreadyIndexed(id));
        }

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO frontier (source, id, url, queued_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![source, id, url, now],
            )
            .map_err(StorageError::from)?;
        tx.commit().map_err(StorageError::from)?;

        if inserted == 0 {
            return Err(EnqueueError::AlreadyQueued(id));
        }

        Ok(FrontierEntry {
            id,
            url: url.to_string(),
            source: source.to_string(),
        })
    }

    fn sample_batch(&self, source: &str, n: usize) -> StorageResult<Vec<FrontierEntry>> {
        let conn = self.conn()?;

        let total = count(&conn, "frontier", None)?;
        if total == 0 || n == 0 {
            return Ok(Vec::new());
        }

        // Offset is bounded by the whole frontier, not this source's share
        let skip = rand::rng().random_range(0..total) as i64;

        let mut stmt = conn.prepare(
            "SELECT source, id, url FROM frontier WHERE source = ?1
             ORDER BY rowid LIMIT ?2 OFFSET ?3",
        )?;
        let entries = stmt
            .query_map(params![source, n as i64, skip], frontier_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn pending(&self, limit: usize) -> StorageResult<Vec<FrontierEntry>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT source, id, url FROM frontier ORDER BY rowid LIMIT ?1")?;
        let entries = stmt
            .query_map(params![limit as i64], frontier_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn remove(&self, entry: &FrontierEntry) -> StorageResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM frontier WHERE source = ?1 AND id = ?2 AND url = ?3",
            params![entry.source, entry.id, entry.url],
        )?;
        Ok(removed > 0)
    }

    fn is_queued(&self, source: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let queued = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM frontier WHERE source = ?1 AND id = ?2)",
            params![source, id],
            |row| row.get(0),
        )?;
        Ok(queued)
    }

    fn count_frontier(&self, source: Option<&str>) -> StorageResult<u64> {
        count(&*self.conn()?, "frontier", source)
    }
}

impl DocumentStore for SqliteStorage {
    fn save_document(&self, url: &str, html: &str, source: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO documents (url, html, source, fetched_at) VALUES (?1, ?2, ?3, ?4)",
            params![url, html, source, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn documents_for_source(
        &self,
        source: &str,
        limit: usize,
    ) -> StorageResult<Vec<CrawledDocument>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, url, html, source, fetched_at FROM documents
             WHERE source = ?1 ORDER BY id LIMIT ?2",
        )?;

        let documents = stmt
            .query_map(params![source, limit as i64], |row| {
                Ok(CrawledDocument {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    html: row.get(2)?,
                    source: row.get(3)?,
                    fetched_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn remove_document(&self, id: i64) -> StorageResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn count_documents(&self, source: Option<&str>) -> StorageResult<u64> {
        count(&*self.conn()?, "documents", source)
    }
}

impl CatalogStore for SqliteStorage {
    fn insert_product(&self, record: &ProductRecord) -> StorageResult<()> {
        let id = frontier_id(&record.url)?;
        let images = serde_json::to_string(&record.images)?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO catalog
             (source, id, name, price, rating, description, url, product_id, images, slug,
              indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.source,
                id,
                record.name,
                record.price,
                record.rating,
                record.description,
                record.url,
                record.product_id,
                images,
                record.slug,
                now,
            ],
        )?;
        tx.execute(
            "DELETE FROM frontier WHERE source = ?1 AND id = ?2",
            params![record.source, id],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn get_product(&self, source: &str, id: &str) -> StorageResult<Option<ProductRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT name, price, rating, description, url, source, product_id, images, slug
                 FROM catalog WHERE source = ?1 AND id = ?2",
                params![source, id],
                |row| {
                    Ok((
                        ProductRecord {
                            name: row.get(0)?,
                            price: row.get(1)?,
                            rating: row.get(2)?,
                            description: row.get(3)?,
                            url: row.get(4)?,
                            source: row.get(5)?,
                            product_id: row.get(6)?,
                            images: Vec::new(),
                            slug: row.get(8)?,
                        },
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((mut record, images)) => {
                record.images = serde_json::from_str(&images)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn is_indexed(&self, source: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let indexed = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM catalog WHERE source = ?1 AND id = ?2)",
            params![source, id],
            |row| row.get(0),
        )?;
        Ok(indexed)
    }

    fn count_products(&self, source: Option<&str>) -> StorageResult<u64> {
        count(&*self.conn()?, "catalog", source)
    }
}
