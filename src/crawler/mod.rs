//! Crawler module for fetching pages and running the pipeline loops
//!
//! This module contains:
//! - HTTP fetching with the pipeline's user agent
//! - HTML normalization and listing-link extraction
//! - The shared crawl stage
//! - The orchestrator that starts every loop

mod coordinator;
mod crawl;
mod fetcher;
mod parser;

pub use coordinator::Orchestrator;
pub use crawl::{CrawlReport, Crawler};
pub use fetcher::{build_http_client, fetch_page, FetchError};
pub use parser::{extract_listing_links, normalize_html};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns true when the sleep was cut short by cancellation.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
