//! Orchestrator: starts and supervises every pipeline loop
//!
//! For each registered source one sniff loop and one index loop are spawned,
//! plus a single crawl loop shared by all sources. The loops never talk to
//! each other; the stores are their only meeting point.

use crate::config::{validate, Config};
use crate::crawler::{build_http_client, Crawler};
use crate::indexer::{build_search_index, Indexer, SearchIndex};
use crate::sources::{Sniffer, SourceRegistry};
use crate::storage::{open_storage, Storage};
use crate::CediError;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Owns the shared resources and launches the pipeline loops
pub struct Orchestrator {
    config: Config,
    storage: Arc<dyn Storage>,
    registry: SourceRegistry,
    client: Client,
    search_index: Arc<dyn SearchIndex>,
}

impl Orchestrator {
    /// Creates an orchestrator from configuration
    ///
    /// Validates the configuration, opens the database and builds the search
    /// index client. Any failure here is a startup failure: no loop runs
    /// without its stores.
    ///
    /// # Arguments
    ///
    /// * `config` - Pipeline configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Stores opened and sources registered
    /// * `Err(CediError)` - Invalid config, or storage, HTTP client or source
    ///   setup failed
    pub fn new(config: Config) -> Result<Self, CediError> {
        validate(&config)?;

        let storage = open_storage(Path::new(&config.storage.database_path))?;
        tracing::info!("Opened database at {}", config.storage.database_path);

        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
        let search_index = build_search_index(&config.search_index, client.clone())?;

        Self::with_parts(config, Arc::new(storage), client, search_index)
    }

    /// Creates an orchestrator around already-initialized resources
    ///
    /// Rejects configurations the loops cannot run with, such as a zero
    /// pause cadence or in-flight cap.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn Storage>,
        client: Client,
        search_index: Arc<dyn SearchIndex>,
    ) -> Result<Self, CediError> {
        validate(&config)?;
        let registry = SourceRegistry::from_config(&config.sources)?;

        Ok(Self {
            config,
            storage,
            registry,
            client,
            search_index,
        })
    }

    /// Registered sources
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Runs every loop until `cancel` fires and all of them have returned
    ///
    /// A loop that panics is logged and triggers cancellation of the rest, so
    /// the process winds down instead of running with a missing stage.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), CediError> {
        let mut tasks = JoinSet::new();

        for adapter in self.registry.adapters() {
            let sniffer = Sniffer::new(
                Arc::clone(adapter),
                Arc::clone(&self.storage),
                self.client.clone(),
                self.config.sniffer.clone(),
            );
            let token = cancel.clone();
            tasks.spawn(async move { sniffer.run(token).await });

            let indexer = Indexer::new(
                Arc::clone(&self.storage),
                Arc::clone(&self.search_index),
                self.config.indexer.clone(),
            );
            let adapter = Arc::clone(adapter);
            let token = cancel.clone();
            tasks.spawn(async move { indexer.run(adapter, token).await });
        }

        let crawler = Crawler::new(
            Arc::clone(&self.storage),
            self.client.clone(),
            self.config.crawler.clone(),
            self.registry.names(),
        );
        let token = cancel.clone();
        tasks.spawn(async move { crawler.run(token).await });

        tracing::info!(
            "Started {} sources ({} loops)",
            self.registry.len(),
            tasks.len()
        );

        let mut first_failure = None;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Pipeline loop failed: {}", e);
                cancel.cancel();
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(CediError::Task(e)),
            None => {
                tracing::info!("All pipeline loops stopped");
                Ok(())
            }
        }
    }
}
