use crate::config::types::{
    Config, CrawlerConfig, IndexerConfig, SearchIndexConfig, SnifferConfig, SourceEntry,
    StorageConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_indexer_config(&config.indexer)?;
    validate_sniffer_config(&config.sniffer)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_search_index_config(&config.search_index)?;
    validate_sources(&config.sources)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 1000, got {}",
            config.batch_size
        )));
    }

    if config.per_source_sample < 1 {
        return Err(ConfigError::Validation(
            "per_source_sample must be >= 1".to_string(),
        ));
    }

    if config.max_in_flight < 1 {
        return Err(ConfigError::Validation(
            "max_in_flight must be >= 1".to_string(),
        ));
    }

    if config.fetch_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms must be >= 100ms, got {}ms",
            config.fetch_timeout_ms
        )));
    }

    Ok(())
}

fn validate_indexer_config(config: &IndexerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "indexer page_size must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_sniffer_config(config: &SnifferConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "sniffer max_pages must be >= 1".to_string(),
        ));
    }

    if config.pause_every < 1 {
        return Err(ConfigError::Validation(
            "sniffer pause_every must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_search_index_config(config: &SearchIndexConfig) -> Result<(), ConfigError> {
    if config.index_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search index name cannot be empty".to_string(),
        ));
    }

    if config.api_key.is_some() && config.app_id.is_none() {
        return Err(ConfigError::Validation(
            "search index api_key is set but app_id is missing".to_string(),
        ));
    }

    if let Some(endpoint) = &config.endpoint {
        validate_http_url(endpoint, "search index endpoint")?;
    }

    Ok(())
}

fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in sources {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "source '{}' is configured more than once",
                entry.name
            )));
        }

        if let Some(base_url) = &entry.base_url {
            validate_http_url(base_url, &format!("base-url of source '{}'", entry.name))?;
        }

        if let Some(categories) = &entry.categories {
            if categories.is_empty() || categories.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "categories of source '{}' must be non-empty strings",
                    entry.name
                )));
            }
        }
    }

    Ok(())
}

/// Requires an absolute http(s) URL
fn validate_http_url(value: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    Ok(())
}
