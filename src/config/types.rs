use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub sniffer: SnifferConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(rename = "search-index", default)]
    pub search_index: SearchIndexConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
}

/// Fetch stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of frontier entries fetched in one crawl cycle
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Entries sampled per source when the frontier exceeds the batch size
    #[serde(rename = "per-source-sample")]
    pub per_source_sample: usize,

    /// Global cap on concurrent fetches
    #[serde(rename = "max-in-flight")]
    pub max_in_flight: usize,

    /// Pause between crawl cycles (milliseconds)
    #[serde(rename = "crawl-interval-ms")]
    pub crawl_interval_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "fetch-timeout-ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            per_source_sample: 5,
            max_in_flight: 16,
            crawl_interval_ms: 30_000,
            fetch_timeout_ms: 30_000,
        }
    }
}

impl CrawlerConfig {
    pub fn crawl_interval(&self) -> Duration {
        Duration::from_millis(self.crawl_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Index stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Documents read per source in one index pass
    #[serde(rename = "page-size")]
    pub page_size: usize,

    /// Sleep when a source has no documents waiting (milliseconds)
    #[serde(rename = "idle-interval-ms")]
    pub idle_interval_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            idle_interval_ms: 60_000,
        }
    }
}

impl IndexerConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

/// Sniff traversal configuration shared by all sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Pagination bound per category
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Throttle after this many listing pages
    #[serde(rename = "pause-every")]
    pub pause_every: u32,

    /// Length of the throttle pause (milliseconds)
    #[serde(rename = "pause-ms")]
    pub pause_ms: u64,

    /// Delay before a finished pass restarts from the top (milliseconds)
    #[serde(rename = "pass-interval-ms")]
    pub pass_interval_ms: u64,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            pause_every: 50,
            pause_ms: 120_000,
            pass_interval_ms: 300_000,
        }
    }
}

impl SnifferConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn pass_interval(&self) -> Duration {
        Duration::from_millis(self.pass_interval_ms)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the identifying user agent: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// External search index configuration
///
/// Credentials normally arrive through the environment rather than the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchIndexConfig {
    /// Base endpoint; derived from the application id when absent
    pub endpoint: Option<String>,

    #[serde(rename = "index-name")]
    pub index_name: String,

    #[serde(rename = "app-id")]
    pub app_id: Option<String>,

    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index_name: "products".to_string(),
            app_id: None,
            api_key: None,
        }
    }
}

impl SearchIndexConfig {
    /// The index is only written when both credentials are present
    pub fn is_enabled(&self) -> bool {
        self.app_id.is_some() && self.api_key.is_some()
    }

    pub fn resolved_endpoint(&self) -> Option<String> {
        match (&self.endpoint, &self.app_id) {
            (Some(endpoint), _) => Some(endpoint.trim_end_matches('/').to_string()),
            (None, Some(app_id)) => Some(format!("https://{}.algolia.net", app_id)),
            (None, None) => None,
        }
    }
}

/// A configured source site
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Registered adapter name (e.g. "Jiji")
    pub name: String,

    /// Overrides the adapter's built-in site root
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,

    /// Overrides the adapter's built-in category list
    pub categories: Option<Vec<String>>,
}
