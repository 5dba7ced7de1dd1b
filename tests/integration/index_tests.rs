//! Index stage publishing to a mock search index

use crate::{create_test_config, http_client, WIDGET_PAGE};
use cedi_search::indexer::build_search_index;
use cedi_search::storage::{CatalogStore, DocumentStore, SqliteStorage};
use cedi_search::{Indexer, SourceRegistry};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACK: &str = r#"{"objectID":"home-garden"}"#;

#[tokio::test]
async fn test_widget_reaches_catalog_and_search_index() {
    let search_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/1/indexes/products/home-garden"))
        .and(header("X-Algolia-Application-Id", "TESTAPP"))
        .and(header("X-Algolia-API-Key", "TESTKEY"))
        .and(body_partial_json(serde_json::json!({
            "name": "Widget",
            "price": 1250.0,
            "slug": "home-garden",
            "source": "Jumia",
            "productID": "WI779EA0XYZ"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACK))
        .expect(1)
        .mount(&search_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");
    let config = create_test_config(
        db_path.to_str().unwrap(),
        "https://www.jumia.com.gh",
        Some(search_server.uri()),
    );

    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    storage
        .save_document(
            "https://www.jumia.com.gh/home-garden/widget-77",
            WIDGET_PAGE,
            "Jumia",
        )
        .unwrap();

    let registry = SourceRegistry::from_config(&config.sources).unwrap();
    let search_index = build_search_index(&config.search_index, http_client()).unwrap();
    let indexer = Indexer::new(storage.clone(), search_index, config.indexer.clone());

    let report = indexer
        .run_cycle(registry.get("Jumia").unwrap().as_ref())
        .await
        .unwrap();
    assert_eq!(report.indexed, 1);
    assert_eq!(report.unpublished, 0);

    let record = storage
        .get_product("Jumia", "/home-garden/widget-77")
        .unwrap()
        .expect("widget in catalog");
    assert_eq!(record.name, "Widget");
    assert_eq!(record.price, 1250.00);
    assert_eq!(record.slug, "home-garden");
    assert_eq!(record.images, vec!["https://gh.jumia.test/widget-1.jpg"]);

    assert_eq!(storage.count_documents(None).unwrap(), 0);
}

#[tokio::test]
async fn test_missing_price_never_reaches_search_index() {
    let search_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&search_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");
    let config = create_test_config(
        db_path.to_str().unwrap(),
        "https://www.jumia.com.gh",
        Some(search_server.uri()),
    );

    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    storage
        .save_document(
            "https://www.jumia.com.gh/home-garden/widget-77",
            "<html><body><h1>Widget</h1><p>Out of stock</p></body></html>",
            "Jumia",
        )
        .unwrap();
    let catalog_before = storage.count_products(None).unwrap();

    let registry = SourceRegistry::from_config(&config.sources).unwrap();
    let search_index = build_search_index(&config.search_index, http_client()).unwrap();
    let indexer = Indexer::new(storage.clone(), search_index, config.indexer.clone());

    let report = indexer
        .run_cycle(registry.get("Jumia").unwrap().as_ref())
        .await
        .unwrap();

    assert_eq!(report.dropped, 1);
    assert_eq!(storage.count_documents(None).unwrap(), 0);
    assert_eq!(storage.count_products(None).unwrap(), catalog_before);
}

#[tokio::test]
async fn test_search_outage_keeps_catalog_record() {
    let search_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&search_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");
    let config = create_test_config(
        db_path.to_str().unwrap(),
        "https://www.jumia.com.gh",
        Some(search_server.uri()),
    );

    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    storage
        .save_document(
            "https://www.jumia.com.gh/home-garden/widget-77",
            WIDGET_PAGE,
            "Jumia",
        )
        .unwrap();

    let registry = SourceRegistry::from_config(&config.sources).unwrap();
    let search_index = build_search_index(&config.search_index, http_client()).unwrap();
    let indexer = Indexer::new(storage.clone(), search_index, config.indexer.clone());

    let report = indexer
        .run_cycle(registry.get("Jumia").unwrap().as_ref())
        .await
        .unwrap();

    assert_eq!(report.indexed, 1);
    assert_eq!(report.unpublished, 1);
    let indexed = storage.is_indexed("Jumia", "/home-garden/widget-77");
    assert!(indexed.unwrap());
    assert_eq!(storage.count_documents(None).unwrap(), 0);
}
