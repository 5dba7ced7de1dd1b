//! Integration tests for the pipeline
//!
//! These tests use wiremock to stand in for the source sites and the search
//! index, and drive the stages against real SQLite databases.

mod crawl_tests;
mod index_tests;
mod pipeline_tests;

use cedi_search::config::{
    Config, CrawlerConfig, IndexerConfig, SearchIndexConfig, SnifferConfig, SourceEntry,
    StorageConfig, UserAgentConfig,
};
use cedi_search::crawler::build_http_client;
use reqwest::Client;
use std::time::Duration;

pub const WIDGET_PAGE: &str = r#"
    <html><head><title>Widget | Jumia Ghana</title></head><body>
        <h1>Widget</h1>
        <span class="-prxs">GHS 1,250.00</span>
        <div class="stars">4.0 out of 5</div>
        <div class="-mhm">A sturdy widget for the garden.</div>
        <ul><li class="-pvxs">SKU: WI779EA0XYZ</li></ul>
        <img class="-fw" data-src="https://gh.jumia.test/widget-1.jpg">
    </body></html>
"#;

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

pub fn http_client() -> Client {
    build_http_client(&user_agent(), Duration::from_secs(5)).expect("Failed to build client")
}

/// A configuration with one Jumia source served from `site_url`
///
/// Every interval is a few milliseconds so loops turn over quickly.
pub fn create_test_config(db_path: &str, site_url: &str, search_url: Option<String>) -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 10,
            per_source_sample: 5,
            max_in_flight: 4,
            crawl_interval_ms: 20,
            fetch_timeout_ms: 5_000,
        },
        indexer: IndexerConfig {
            page_size: 5,
            idle_interval_ms: 20,
        },
        sniffer: SnifferConfig {
            max_pages: 3,
            pause_every: 50,
            pause_ms: 20,
            pass_interval_ms: 50,
        },
        user_agent: user_agent(),
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        search_index: SearchIndexConfig {
            endpoint: search_url,
            index_name: "products".to_string(),
            app_id: Some("TESTAPP".to_string()),
            api_key: Some("TESTKEY".to_string()),
        },
        sources: vec![SourceEntry {
            name: "Jumia".to_string(),
            base_url: Some(site_url.to_string()),
            categories: Some(vec!["home-garden".to_string()]),
        }],
    }
}
