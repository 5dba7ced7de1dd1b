//! Storage traits and error types
//!
//! The pipeline persists three collections: the frontier, crawled documents
//! and the product catalog. Each gets its own trait so stages depend only on
//! the collections they touch.

use crate::storage::{CrawledDocument, FrontierEntry, ProductRecord};
use crate::UrlError;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record URL: {0}")]
    Url(#[from] UrlError),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Why a URL was not added to the frontier
///
/// `AlreadyQueued` and `AlreadyIndexed` are normal outcomes during sniffing,
/// not failures.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("already queued: {0}")]
    AlreadyQueued(String),

    #[error("already indexed: {0}")]
    AlreadyIndexed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EnqueueError {
    /// True for the dedup outcomes that callers skip silently
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyQueued(_) | Self::AlreadyIndexed(_))
    }
}

/// Persistent, deduplicated queue of URLs awaiting fetch
pub trait FrontierStore {
    /// Adds a URL to the frontier
    ///
    /// The URL is reduced to its normalized path, which together with the
    /// source is the dedup key. Fails if that key is already queued or already
    /// present in the catalog. This is the only place queueability is decided.
    fn enqueue(&self, url: &str, source: &str) -> Result<FrontierEntry, EnqueueError>;

    /// Returns up to `n` entries for `source`
    ///
    /// Sampling starts at a random offset bounded by the count of all
    /// frontier entries, not just this source's. Sources with few entries are
    /// therefore more likely to come back empty; callers treat the result as a
    /// best-effort sample.
    fn sample_batch(&self, source: &str, n: usize) -> StorageResult<Vec<FrontierEntry>>;

    /// Returns up to `limit` entries across all sources, oldest first
    fn pending(&self, limit: usize) -> StorageResult<Vec<FrontierEntry>>;

    /// Deletes an entry by exact match
    ///
    /// Returns false when the entry was already gone.
    fn remove(&self, entry: &FrontierEntry) -> StorageResult<bool>;

    /// Checks whether a dedup key is queued
    fn is_queued(&self, source: &str, id: &str) -> StorageResult<bool>;

    /// Counts queued entries, optionally for one source
    fn count_frontier(&self, source: Option<&str>) -> StorageResult<u64>;
}

/// Holding area for fetched pages awaiting extraction
pub trait DocumentStore {
    /// Stores a fetched page and returns its row id
    fn save_document(&self, url: &str, html: &str, source: &str) -> StorageResult<i64>;

    /// Reads up to `limit` documents for a source, oldest first
    fn documents_for_source(&self, source: &str, limit: usize)
        -> StorageResult<Vec<CrawledDocument>>;

    /// Deletes a document; returns false when it was already gone
    fn remove_document(&self, id: i64) -> StorageResult<bool>;

    /// Counts stored documents, optionally for one source
    fn count_documents(&self, source: Option<&str>) -> StorageResult<u64>;
}

/// Finalized product records
pub trait CatalogStore {
    /// Writes a product record, replacing any earlier version of the same page
    ///
    /// Any frontier entry with the same key is removed in the same
    /// transaction, so a page never sits in both collections.
    fn insert_product(&self, record: &ProductRecord) -> StorageResult<()>;

    /// Looks up a product by source and normalized path
    fn get_product(&self, source: &str, id: &str) -> StorageResult<Option<ProductRecord>>;

    /// Checks whether a dedup key is already in the catalog
    fn is_indexed(&self, source: &str, id: &str) -> StorageResult<bool>;

    /// Counts catalog records, optionally for one source
    fn count_products(&self, source: Option<&str>) -> StorageResult<u64>;
}

/// Every collection the pipeline needs, shareable across tasks
pub trait Storage: FrontierStore + DocumentStore + CatalogStore + Send + Sync {}

impl<T> Storage for T where T: FrontierStore + DocumentStore + CatalogStore + Send + Sync {}
