//! Source adapters: one per e-commerce site
//!
//! An adapter knows two things about its site: how to walk its listing pages
//! (the sniff traversal) and how to read a product page (extraction). The
//! rest of the pipeline only ever sees the `SourceAdapter` trait, looked up
//! by name in a `SourceRegistry`.

mod extract;
mod jiji;
mod jumia;
mod sniff;

pub use extract::{
    parse_price, parse_rating, price_field, require, select_all_attrs, select_attr, select_text,
    ExtractionError,
};
pub use jiji::JijiAdapter;
pub use jumia::JumiaAdapter;
pub use sniff::{SniffReport, Sniffer};

use crate::config::SourceEntry;
use crate::storage::{CrawledDocument, ProductRecord};
use crate::{CediError, ConfigError, UrlError};
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Site-specific discovery and extraction rules
pub trait SourceAdapter: Send + Sync {
    /// Source identifier stored with every frontier entry and record
    fn name(&self) -> &str;

    /// The site's categories, in their configured order
    fn categories(&self) -> &[String];

    /// URL of one listing page of a category, numbered from 1
    fn page_url(&self, category: &str, page: u32) -> Result<Url, UrlError>;

    /// Product links on a listing page, absolute and without query strings
    fn listing_links(&self, document: &Html, page_url: &Url) -> Vec<String>;

    /// Reads a product record out of a crawled page
    ///
    /// The returned record carries the document's url and source. Its slug is
    /// left empty; the index stage derives it from the url.
    fn extract(&self, document: &CrawledDocument) -> Result<ProductRecord, ExtractionError>;
}

/// Where a site lives and which categories are walked
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub base_url: Url,
    pub categories: Vec<String>,
}

impl SiteLayout {
    /// Applies a source entry's overrides to an adapter's defaults
    pub fn resolve(
        entry: &SourceEntry,
        default_base_url: &str,
        default_categories: &[&str],
    ) -> Result<Self, ConfigError> {
        let base = entry.base_url.as_deref().unwrap_or(default_base_url);
        let base_url = site_root(base)?;

        let categories = match &entry.categories {
            Some(categories) => categories.clone(),
            None => default_categories.iter().map(|c| c.to_string()).collect(),
        };

        Ok(Self {
            base_url,
            categories,
        })
    }

    /// `{base}/{category}?page={page}`
    pub fn category_page(&self, category: &str, page: u32) -> Result<Url, UrlError> {
        let mut url = self
            .base_url
            .join(category.trim_start_matches('/'))
            .map_err(|e| UrlError::Parse(e.to_string()))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

/// Parses a site root so that relative joins land under it
fn site_root(base: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(base).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Adapters keyed by source name
#[derive(Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one adapter per configured source
    ///
    /// # Returns
    ///
    /// * `Ok(SourceRegistry)` - Every source maps to a known adapter
    /// * `Err(CediError::UnknownSource)` - A source name has no adapter
    pub fn from_config(entries: &[SourceEntry]) -> Result<Self, CediError> {
        let mut registry = Self::new();

        for entry in entries {
            let adapter: Arc<dyn SourceAdapter> = match entry.name.to_ascii_lowercase().as_str() {
                "jiji" => Arc::new(JijiAdapter::new(entry)?),
                "jumia" => Arc::new(JumiaAdapter::new(entry)?),
                _ => return Err(CediError::UnknownSource(entry.name.clone())),
            };
            registry.register(adapter);
        }

        Ok(registry)
    }

    /// Adds an adapter, replacing any adapter with the same name
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters
            .retain(|existing| existing.name() != adapter.name());
        self.adapters.push(adapter);
    }

    /// Looks up an adapter by source name
    pub fn get(&self, name: &str) -> Result<Arc<dyn SourceAdapter>, CediError> {
        self.adapters
            .iter()
            .find(|adapter| adapter.name() == name)
            .cloned()
            .ok_or_else(|| CediError::UnknownSource(name.to_string()))
    }

    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn names(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| adapter.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
