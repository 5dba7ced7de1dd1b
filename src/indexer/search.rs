//! Search index client
//!
//! The search index mirrors the catalog. Records are upserted by slug over an
//! Algolia-compatible REST API; with no credentials configured a disabled
//! index stands in and only logs.

use crate::config::SearchIndexConfig;
use crate::storage::ProductRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the external search index
#[derive(Debug, Error)]
pub enum SearchIndexError {
    #[error("search index request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search index rejected {object_id}: HTTP {status}")]
    Rejected { object_id: String, status: u16 },

    #[error("search index is enabled but has no endpoint")]
    MissingEndpoint,
}

/// Write side of the search index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Creates or replaces the object keyed by `record.slug`
    async fn upsert(&self, record: &ProductRecord) -> Result<(), SearchIndexError>;
}

/// Algolia-compatible REST index
pub struct HttpSearchIndex {
    client: Client,
    endpoint: String,
    index_name: String,
    app_id: String,
    api_key: String,
}

impl HttpSearchIndex {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        index_name: impl Into<String>,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            index_name: index_name.into(),
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    fn object_url(&self, object_id: &str) -> String {
        format!(
            "{}/1/indexes/{}/{}",
            self.endpoint, self.index_name, object_id
        )
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn upsert(&self, record: &ProductRecord) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .put(self.object_url(&record.slug))
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchIndexError::Rejected {
                object_id: record.slug.clone(),
                status: status.as_u16(),
            });
        }

        tracing::debug!("Search index updated: {}", record.slug);
        Ok(())
    }
}

/// Stand-in used when no credentials are configured
pub struct DisabledSearchIndex;

#[async_trait]
impl SearchIndex for DisabledSearchIndex {
    async fn upsert(&self, record: &ProductRecord) -> Result<(), SearchIndexError> {
        tracing::debug!("Search index disabled, not publishing {}", record.slug);
        Ok(())
    }
}

/// Builds the search index described by configuration
pub fn build_search_index(
    config: &SearchIndexConfig,
    client: Client,
) -> Result<Arc<dyn SearchIndex>, SearchIndexError> {
    let (Some(app_id), Some(api_key)) = (&config.app_id, &config.api_key) else {
        tracing::warn!("Search index credentials not configured, records stay catalog-only");
        return Ok(Arc::new(DisabledSearchIndex));
    };

    let endpoint = config
        .resolved_endpoint()
        .ok_or(SearchIndexError::MissingEndpoint)?;
    tracing::info!(
        "Publishing to search index {} at {}",
        config.index_name,
        endpoint
    );

    Ok(Arc::new(HttpSearchIndex::new(
        client,
        endpoint,
        config.index_name.clone(),
        app_id.clone(),
        api_key.clone(),
    )))
}
