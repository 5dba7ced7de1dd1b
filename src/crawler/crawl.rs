//! Fetch stage: turns frontier entries into stored documents
//!
//! Each cycle selects a batch from the frontier, fetches every entry
//! concurrently and waits for the whole batch before returning. A page is
//! written to the document store before its frontier entry is removed, so a
//! crash between the two steps can duplicate a document but never lose one.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::fetch_page;
use crate::crawler::parser::normalize_html;
use crate::crawler::pause;
use crate::storage::{FrontierEntry, Storage, StorageResult};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of one crawl cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Entries selected from the frontier
    pub selected: usize,
    /// Entries fetched, stored and removed from the frontier
    pub fetched: usize,
    /// Entries left in the frontier for a later cycle
    pub failed: usize,
}

/// The shared crawl loop
pub struct Crawler {
    storage: Arc<dyn Storage>,
    client: Client,
    config: CrawlerConfig,
    sources: Vec<String>,
    /// Global cap on fetches in flight
    in_flight: Arc<Semaphore>,
}

impl Crawler {
    /// Creates a crawler over the given sources
    ///
    /// # Arguments
    ///
    /// * `storage` - Frontier and document stores
    /// * `client` - HTTP client carrying the pipeline's user agent
    /// * `config` - Batch and concurrency bounds
    /// * `sources` - Names sampled when the frontier exceeds one batch
    pub fn new(
        storage: Arc<dyn Storage>,
        client: Client,
        config: CrawlerConfig,
        sources: Vec<String>,
    ) -> Self {
        let in_flight = Arc::new(Semaphore::new(config.max_in_flight));

        Self {
            storage,
            client,
            config,
            sources,
            in_flight,
        }
    }

    /// Runs crawl cycles until `cancel` fires
    ///
    /// A batch already in flight always runs to completion; cancellation only
    /// prevents the next cycle from starting.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Crawl loop started");

        while !cancel.is_cancelled() {
            match self.run_cycle().await {
                Ok(report) if report.selected > 0 => tracing::info!(
                    "Crawl cycle finished: {} fetched, {} left for retry",
                    report.fetched,
                    report.failed
                ),
                Ok(_) => {}
                Err(e) => tracing::error!("Crawl cycle failed: {}", e),
            }

            tracing::debug!(
                "Waiting {:?} before the next crawl cycle",
                self.config.crawl_interval()
            );
            if pause(&cancel, self.config.crawl_interval()).await {
                break;
            }
        }

        tracing::info!("Crawl loop stopped");
    }

    /// Runs one crawl cycle
    ///
    /// Returns once every fetch in the batch has finished. Fetch failures are
    /// counted in the report; only a failure to read the frontier is an error.
    pub async fn run_cycle(&self) -> StorageResult<CrawlReport> {
        let batch = self.select_batch()?;

        if batch.is_empty() {
            tracing::info!("Frontier is empty, nothing to crawl");
            return Ok(CrawlReport::default());
        }

        let mut report = CrawlReport {
            selected: batch.len(),
            ..CrawlReport::default()
        };
        tracing::info!("Crawling batch of {} URLs", batch.len());

        let mut tasks = JoinSet::new();
        for entry in batch {
            let storage = Arc::clone(&self.storage);
            let client = self.client.clone();
            let in_flight = Arc::clone(&self.in_flight);

            tasks.spawn(async move {
                let Ok(_permit) = in_flight.acquire_owned().await else {
                    return false;
                };
                crawl_entry(&client, storage.as_ref(), &entry).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.fetched += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    tracing::error!("Fetch task panicked: {}", e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Picks the entries for the next cycle
    ///
    /// A frontier that fits in one batch is taken whole. A larger one is
    /// sampled per source; if every sample comes back empty the oldest
    /// entries are taken instead so the cycle still makes progress.
    fn select_batch(&self) -> StorageResult<Vec<FrontierEntry>> {
        let batch_size = self.config.batch_size;
        let total = self.storage.count_frontier(None)?;

        if total <= batch_size as u64 {
            return self.storage.pending(batch_size);
        }

        let per_source = self.config.per_source_sample;
        let mut batch = Vec::new();
        for source in &self.sources {
            batch.extend(self.storage.sample_batch(source, per_source)?);
        }

        if batch.is_empty() {
            tracing::debug!("Frontier sample came back empty, taking the oldest entries");
            return self.storage.pending(batch_size);
        }

        batch.truncate(batch_size);
        Ok(batch)
    }
}

/// Fetches one entry and moves it into the document store
///
/// Returns true when the entry was stored and removed from the frontier.
async fn crawl_entry(client: &Client, storage: &dyn Storage, entry: &FrontierEntry) -> bool {
    tracing::debug!("Crawling: {}", entry.url);

    let body = match fetch_page(client, &entry.url).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Fetch failed, keeping {} queued: {}", entry.url, e);
            return false;
        }
    };

    let html = normalize_html(&body);

    if let Err(e) = storage.save_document(&entry.url, &html, &entry.source) {
        tracing::error!("Failed to store document for {}: {}", entry.url, e);
        return false;
    }

    if let Err(e) = storage.remove(entry) {
        // The document is stored; a later cycle may fetch it again
        tracing::error!("Failed to dequeue {}: {}", entry.url, e);
        return true;
    }

    tracing::debug!("Crawled: {}", entry.url);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use crate::crawler::build_http_client;
    use crate::storage::{DocumentStore, FrontierStore, SqliteStorage};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> CrawlerConfig {
        CrawlerConfig {
            batch_size: 10,
            per_source_sample: 5,
            max_in_flight: 4,
            crawl_interval_ms: 10,
            fetch_timeout_ms: 2000,
        }
    }

    fn create_crawler(storage: Arc<SqliteStorage>, config: CrawlerConfig) -> Crawler {
        let user_agent = UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
        };
        let client = build_http_client(&user_agent, config.fetch_timeout()).unwrap();
        Crawler::new(
            storage,
            client,
            config,
            vec!["A".to_string(), "B".to_string()],
        )
    }

    #[tokio::test]
    async fn test_empty_frontier_is_a_noop() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let crawler = create_crawler(storage, create_test_config());

        let report = crawler.run_cycle().await.unwrap();
        assert_eq!(report, CrawlReport::default());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/x/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        storage
            .enqueue(&format!("{}/x/ok", server.uri()), "A")
            .unwrap();
        storage
            .enqueue(&format!("{}/x/broken", server.uri()), "A")
            .unwrap();

        let crawler = create_crawler(Arc::clone(&storage), create_test_config());
        let report = crawler.run_cycle().await.unwrap();

        assert_eq!(report.selected, 2);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.failed, 1);
        assert!(storage.is_queued("A", "/x/broken").unwrap());
        assert!(!storage.is_queued("A", "/x/ok").unwrap());
        assert_eq!(storage.count_documents(Some("A")).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_large_frontier_is_bounded_by_batch_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>item</p>"))
            .mount(&server)
            .await;

        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        for i in 0..12 {
            storage
                .enqueue(&format!("{}/item/{}", server.uri(), i), "A")
                .unwrap();
        }

        let config = CrawlerConfig {
            batch_size: 4,
            per_source_sample: 3,
            ..create_test_config()
        };
        let crawler = create_crawler(Arc::clone(&storage), config);
        let report = crawler.run_cycle().await.unwrap();

        assert!(report.selected >= 1 && report.selected <= 4);
        assert_eq!(report.fetched, report.selected);
        assert_eq!(
            storage.count_frontier(None).unwrap(),
            12 - report.fetched as u64
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let crawler = create_crawler(storage, create_test_config());
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { crawler.run(cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
