//! Cedi Search: a product catalog built from crawled e-commerce listings
//!
//! This crate implements the crawl–extract–index pipeline: per-source sniffers
//! discover listing URLs into a persistent frontier, a shared crawler archives
//! raw pages, and per-source indexers extract product records into the catalog
//! and its search index mirror.

pub mod config;
pub mod crawler;
pub mod indexer;
pub mod output;
pub mod sources;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum CediError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Search index error: {0}")]
    SearchIndex(#[from] indexer::SearchIndexError),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("URL has no slug segment: {0}")]
    MissingSlug(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, CediError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Orchestrator};
pub use indexer::{Indexer, SearchIndex};
pub use sources::{SourceAdapter, SourceRegistry};
pub use storage::{CrawledDocument, FrontierEntry, ProductRecord, SqliteStorage};
pub use url::{derive_slug, frontier_id, strip_query};
