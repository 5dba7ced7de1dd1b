//! Configuration module for the pipeline
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering environment-provided credentials on top.
//!
//! # Example
//!
//! ```no_run
//! use cedi_search::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cedi.toml")).unwrap();
//! println!("Crawl batch size: {}", config.crawler.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IndexerConfig, SearchIndexConfig, SnifferConfig, SourceEntry,
    StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
    ENV_ALGOLIA_API_KEY, ENV_ALGOLIA_APP_ID, ENV_DATABASE_PATH,
};
pub use validation::validate;
