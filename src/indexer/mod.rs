//! Index stage: turns stored documents into catalog records
//!
//! Per source, documents are drained a page at a time. Each one is extracted
//! with the source's adapter, written to the catalog and then mirrored into
//! the search index. The document is deleted whether or not extraction
//! succeeded, so a page that never parses is not retried forever.
//!
//! The catalog and the search index are written one after the other with no
//! shared transaction. When the index write fails the catalog keeps the
//! record and the two stay out of step until the record is published again.

mod search;

pub use search::{
    build_search_index, DisabledSearchIndex, HttpSearchIndex, SearchIndex, SearchIndexError,
};

use crate::config::IndexerConfig;
use crate::crawler::pause;
use crate::sources::{ExtractionError, SourceAdapter};
use crate::storage::{CrawledDocument, Storage, StorageResult};
use crate::url::derive_slug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counters for one index cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Records written to the catalog
    pub indexed: usize,
    /// Documents discarded because they could not be extracted
    pub dropped: usize,
    /// Documents kept because the catalog write failed
    pub deferred: usize,
    /// Catalog records the search index did not accept
    pub unpublished: usize,
}

impl IndexReport {
    /// Documents that left the document store this cycle
    pub fn consumed(&self) -> usize {
        self.indexed + self.dropped
    }
}

enum Outcome {
    Indexed { published: bool },
    Dropped,
    Deferred,
}

/// Index loop for the pipeline's sources
pub struct Indexer {
    storage: Arc<dyn Storage>,
    search_index: Arc<dyn SearchIndex>,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(
        storage: Arc<dyn Storage>,
        search_index: Arc<dyn SearchIndex>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            storage,
            search_index,
            config,
        }
    }

    /// Indexes `adapter`'s documents until `cancel` fires
    ///
    /// Sleeps for the idle interval whenever a cycle consumes nothing.
    pub async fn run(&self, adapter: Arc<dyn SourceAdapter>, cancel: CancellationToken) {
        let source = adapter.name();
        tracing::info!("Indexing {}", source);

        while !cancel.is_cancelled() {
            let idle = match self.run_cycle(adapter.as_ref()).await {
                Ok(report) if report.consumed() == 0 => {
                    tracing::debug!(
                        "No pages to index for {}, waiting {:?}",
                        source,
                        self.config.idle_interval()
                    );
                    true
                }
                Ok(report) => {
                    tracing::info!(
                        "Indexed {} products for {} ({} dropped, {} unpublished)",
                        report.indexed,
                        source,
                        report.dropped,
                        report.unpublished
                    );
                    false
                }
                Err(e) => {
                    tracing::error!("Index cycle for {} failed: {}", source, e);
                    true
                }
            };

            if idle && pause(&cancel, self.config.idle_interval()).await {
                break;
            }
        }

        tracing::info!("Index loop for {} stopped", source);
    }

    /// Indexes one page of `adapter`'s documents
    ///
    /// Only a failure to read the document store is returned as an error;
    /// per-document failures are counted in the report.
    pub async fn run_cycle(&self, adapter: &dyn SourceAdapter) -> StorageResult<IndexReport> {
        let documents = self
            .storage
            .documents_for_source(adapter.name(), self.config.page_size)?;

        let mut report = IndexReport::default();
        for document in &documents {
            match self.index_document(adapter, document).await {
                Outcome::Indexed { published } => {
                    report.indexed += 1;
                    if !published {
                        report.unpublished += 1;
                    }
                }
                Outcome::Dropped => report.dropped += 1,
                Outcome::Deferred => report.deferred += 1,
            }
        }

        Ok(report)
    }

    async fn index_document(
        &self,
        adapter: &dyn SourceAdapter,
        document: &CrawledDocument,
    ) -> Outcome {
        let source = adapter.name();

        let mut record = match adapter.extract(document) {
            Ok(record) => record,
            Err(e) => {
                log_extraction_failure(source, &document.url, &e);
                self.discard(document);
                return Outcome::Dropped;
            }
        };

        record.slug = match derive_slug(&record.url) {
            Ok(slug) => slug,
            Err(e) => {
                tracing::warn!("Dropping {} document {}: {}", source, document.url, e);
                self.discard(document);
                return Outcome::Dropped;
            }
        };

        if let Err(e) = self.storage.insert_product(&record) {
            tracing::error!(
                "Catalog write failed for {}, keeping document for retry: {}",
                document.url,
                e
            );
            return Outcome::Deferred;
        }

        let published = match self.search_index.upsert(&record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Search index update failed for {}: {}", record.slug, e);
                false
            }
        };

        self.discard(document);
        tracing::debug!("Indexed {} ({})", record.name, record.url);

        Outcome::Indexed { published }
    }

    fn discard(&self, document: &CrawledDocument) {
        if let Err(e) = self.storage.remove_document(document.id) {
            tracing::error!("Failed to remove document {}: {}", document.id, e);
        }
    }
}

/// Missing fields are routine on sold-out or removed listings; a malformed
/// field means a selector no longer matches the site.
fn log_extraction_failure(source: &str, url: &str, error: &ExtractionError) {
    if error.needs_attention() {
        tracing::error!("{} extraction regression on {}: {}", source, url, error);
    } else {
        tracing::warn!("Dropping {} document {}: {}", source, url, error);
    }
}
