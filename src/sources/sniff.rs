//! Sniff loop: walks a source's listing pages and fills the frontier

use crate::config::SnifferConfig;
use crate::crawler::{fetch_page, pause};
use crate::sources::SourceAdapter;
use crate::storage::{EnqueueError, Storage};
use rand::seq::SliceRandom;
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Counters for one pass over a source's categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SniffReport {
    /// Listing pages fetched and scanned
    pub pages: u32,
    /// Links added to the frontier
    pub enqueued: usize,
    /// Links already queued or already in the catalog
    pub duplicates: usize,
    /// Links the frontier refused as invalid, or that hit a store error
    pub rejected: usize,
}

/// Discovery loop for one source
pub struct Sniffer {
    adapter: Arc<dyn SourceAdapter>,
    storage: Arc<dyn Storage>,
    client: Client,
    config: SnifferConfig,
}

impl Sniffer {
    pub fn new(
        adapter: Arc<dyn SourceAdapter>,
        storage: Arc<dyn Storage>,
        client: Client,
        config: SnifferConfig,
    ) -> Self {
        Self {
            adapter,
            storage,
            client,
            config,
        }
    }

    /// Runs passes until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        let source = self.adapter.name();
        tracing::info!("Sniffing {}", source);

        while !cancel.is_cancelled() {
            let report = self.sniff_pass(&cancel).await;
            tracing::info!(
                "Sniff pass for {} finished: {} pages, {} new, {} already known, {} rejected",
                source,
                report.pages,
                report.enqueued,
                report.duplicates,
                report.rejected
            );

            if pause(&cancel, self.config.pass_interval()).await {
                break;
            }
        }

        tracing::info!("Sniff loop for {} stopped", source);
    }

    /// Walks every category once, in shuffled order
    ///
    /// A category ends at `max-pages`, or earlier when a page fails to load
    /// or carries no listing links. Returns early on cancellation.
    pub async fn sniff_pass(&self, cancel: &CancellationToken) -> SniffReport {
        let source = self.adapter.name();
        let mut report = SniffReport::default();

        let mut categories = self.adapter.categories().to_vec();
        categories.shuffle(&mut rand::rng());

        for category in &categories {
            for page in 1..=self.config.max_pages {
                if cancel.is_cancelled() {
                    return report;
                }

                let page_url = match self.adapter.page_url(category, page) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::error!("Bad listing URL for {}/{}: {}", source, category, e);
                        break;
                    }
                };

                tracing::debug!("Extracting products from {}", page_url);
                let body = match fetch_page(&self.client, page_url.as_str()).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!(
                            "Listing page failed, leaving {}/{}: {}",
                            source,
                            category,
                            e
                        );
                        break;
                    }
                };

                let links = self.links_on_page(&body, &page_url);
                if links.is_empty() {
                    tracing::debug!(
                        "No listings on {}, end of {}/{}",
                        page_url,
                        source,
                        category
                    );
                    break;
                }

                report.pages += 1;
                self.enqueue_all(&links, &mut report);

                if page % self.config.pause_every == 0 {
                    tracing::info!("Pausing {} sniff for {:?}", source, self.config.pause());
                    if pause(cancel, self.config.pause()).await {
                        return report;
                    }
                }
            }
        }

        report
    }

    fn links_on_page(&self, body: &str, page_url: &Url) -> Vec<String> {
        let document = Html::parse_document(body);
        self.adapter.listing_links(&document, page_url)
    }

    fn enqueue_all(&self, links: &[String], report: &mut SniffReport) {
        let source = self.adapter.name();

        for link in links {
            match self.storage.enqueue(link, source) {
                Ok(entry) => {
                    tracing::trace!("Queued {}", entry.url);
                    report.enqueued += 1;
                }
                Err(e) if e.is_duplicate() => {
                    tracing::trace!("Skipping {}: {}", link, e);
                    report.duplicates += 1;
                }
                Err(EnqueueError::InvalidUrl(e)) => {
                    tracing::debug!("Skipping invalid link {}: {}", link, e);
                    report.rejected += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to queue {}: {}", link, e);
                    report.rejected += 1;
                }
            }
        }
    }
}
