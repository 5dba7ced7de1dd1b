//! Whole-pipeline runs: sniff, crawl and index against a mock site

use crate::{create_test_config, WIDGET_PAGE};
use cedi_search::indexer::DisabledSearchIndex;
use cedi_search::storage::{CatalogStore, FrontierStore, SqliteStorage};
use cedi_search::{CediError, Orchestrator};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WIDGET_ID: &str = "/home-garden/widget-77";
const SOLD_OUT_ID: &str = "/home-garden/sold-out-12";

const CATEGORY_PAGE: &str = r#"<html><body>
    <article class="prd"><a class="core" href="/home-garden/widget-77?shop=1">Widget</a></article>
    <article class="prd"><a class="core" href="/home-garden/sold-out-12">Sold out</a></article>
</body></html>"#;

const SOLD_OUT_PAGE: &str = "<html><body><h1>Sold out</h1></body></html>";

/// Mounts a one-page Jumia category listing the widget and a sold-out item
async fn mount_site(site: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/home-garden"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATEGORY_PAGE))
        .mount(site)
        .await;
    Mock::given(method("GET"))
        .and(path("/home-garden"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>No results</p>"))
        .mount(site)
        .await;
    Mock::given(method("GET"))
        .and(path(WIDGET_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(WIDGET_PAGE))
        .mount(site)
        .await;
    Mock::given(method("GET"))
        .and(path(SOLD_OUT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_string(SOLD_OUT_PAGE))
        .mount(site)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_orchestrator_runs_pipeline_until_cancelled() {
    let site = MockServer::start().await;
    mount_site(&site).await;

    let search_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/1/indexes/products/home-garden"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1..)
        .mount(&search_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pipeline.db");
    let config = create_test_config(
        db_path.to_str().unwrap(),
        &site.uri(),
        Some(search_server.uri()),
    );

    let orchestrator = Orchestrator::new(config).expect("Failed to create orchestrator");
    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run(cancel).await })
    };

    let observer = SqliteStorage::new(&db_path).unwrap();
    let mut indexed = false;
    for _ in 0..200 {
        if observer.is_indexed("Jumia", WIDGET_ID).unwrap() {
            indexed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("Pipeline did not stop after cancellation")
        .expect("Pipeline task panicked");
    assert!(result.is_ok());
    assert!(indexed, "widget was never indexed");

    let record = observer.get_product("Jumia", WIDGET_ID).unwrap().unwrap();
    assert_eq!(record.slug, "home-garden");
    assert_eq!(record.price, 1250.0);
    assert_eq!(record.url, format!("{}{}", site.uri(), WIDGET_ID));

    // The page without a price never becomes a product
    assert!(!observer.is_indexed("Jumia", SOLD_OUT_ID).unwrap());
    assert!(!observer.is_queued("Jumia", WIDGET_ID).unwrap());
}

#[tokio::test]
async fn test_unknown_source_fails_startup() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pipeline.db");
    let mut config = create_test_config(db_path.to_str().unwrap(), "https://shop.test", None);
    config.sources[0].name = "Tonaton".to_string();

    let result = Orchestrator::new(config);
    assert!(matches!(result, Err(CediError::UnknownSource(ref name)) if name == "Tonaton"));
}

#[tokio::test]
async fn test_unopenable_database_fails_startup() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("missing-dir").join("pipeline.db");
    let config = create_test_config(db_path.to_str().unwrap(), "https://shop.test", None);

    let result = Orchestrator::new(config);
    assert!(matches!(result, Err(CediError::Storage(_))));
}

#[tokio::test]
async fn test_zero_pause_cadence_fails_startup() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("pipeline.db");
    let mut config = create_test_config(db_path.to_str().unwrap(), "https://shop.test", None);
    config.sniffer.pause_every = 0;

    let result = Orchestrator::new(config);
    assert!(matches!(result, Err(CediError::Config(_))));
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_zero_in_flight_cap_rejected_with_parts() {
    let mut config = create_test_config(":memory:", "https://shop.test", None);
    config.crawler.max_in_flight = 0;

    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let result = Orchestrator::with_parts(
        config,
        storage,
        reqwest::Client::new(),
        Arc::new(DisabledSearchIndex),
    );
    assert!(matches!(result, Err(CediError::Config(_))));
}
