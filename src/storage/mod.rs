//! Storage module for the pipeline's persistent collections
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The deduplicated URL frontier
//! - Crawled documents awaiting extraction
//! - The product catalog

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    CatalogStore, DocumentStore, EnqueueError, FrontierStore, Storage, StorageError, StorageResult,
};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens the pipeline database, creating the schema if needed
///
/// Failing here is fatal: the pipeline never starts without its stores.
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized path of `url`; the dedup key within a source
    pub id: String,
    pub url: String,
    pub source: String,
}

/// A fetched page waiting for extraction
#[derive(Debug, Clone)]
pub struct CrawledDocument {
    /// Row id assigned by the document store
    pub id: i64,
    pub url: String,
    pub html: String,
    pub source: String,
    pub fetched_at: String,
}

/// A finalized catalog entry, also the search index payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: f64,
    pub rating: f64,
    pub description: String,
    pub url: String,
    pub source: String,
    #[serde(rename = "productID")]
    pub product_id: String,
    pub images: Vec<String>,
    pub slug: String,
}
