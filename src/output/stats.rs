//! Statistics over the pipeline database
//!
//! This module provides functionality for extracting and displaying
//! per-source collection sizes from the storage layer.

use crate::storage::{Storage, StorageResult};

/// Collection sizes for one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatistics {
    pub source: String,

    /// URLs waiting to be crawled
    pub queued: u64,

    /// Pages crawled but not yet indexed
    pub crawled: u64,

    /// Products in the catalog
    pub indexed: u64,
}

/// Pipeline statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStatistics {
    pub sources: Vec<SourceStatistics>,

    /// Totals over every source, including ones no longer configured
    pub total_queued: u64,
    pub total_crawled: u64,
    pub total_indexed: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `sources` - Source names to break the totals down by
pub fn load_statistics(
    storage: &dyn Storage,
    sources: &[String],
) -> StorageResult<PipelineStatistics> {
    let mut per_source = Vec::with_capacity(sources.len());

    for source in sources {
        per_source.push(SourceStatistics {
            source: source.clone(),
            queued: storage.count_frontier(Some(source))?,
            crawled: storage.count_documents(Some(source))?,
            indexed: storage.count_products(Some(source))?,
        });
    }

    Ok(PipelineStatistics {
        sources: per_source,
        total_queued: storage.count_frontier(None)?,
        total_crawled: storage.count_documents(None)?,
        total_indexed: storage.count_products(None)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &PipelineStatistics) {
    println!("=== Pipeline Statistics ===\n");

    println!(
        "{:<16} {:>10} {:>10} {:>10}",
        "Source", "Queued", "Crawled", "Indexed"
    );
    for source in &stats.sources {
        println!(
            "{:<16} {:>10} {:>10} {:>10}",
            source.source, source.queued, source.crawled, source.indexed
        );
    }
    println!(
        "{:<16} {:>10} {:>10} {:>10}",
        "Total", stats.total_queued, stats.total_crawled, stats.total_indexed
    );
    println!();

    let seen = stats.total_queued + stats.total_crawled + stats.total_indexed;
    let indexed_rate = if seen > 0 {
        (stats.total_indexed as f64 / seen as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Indexed: {:.1}% ({} / {} known pages)",
        indexed_rate, stats.total_indexed, seen
    );
}
