//! Crawl stage against a mock site

use crate::{create_test_config, http_client};
use cedi_search::storage::{DocumentStore, FrontierStore, SqliteStorage};
use cedi_search::Crawler;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_cycle_moves_every_entry() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for name in ["alpha", "beta", "gamma"] {
        Mock::given(method("GET"))
            .and(path(format!("/x/{}", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("<html><body><h1>{}</h1></body></html>", name)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());

    for name in ["alpha", "beta", "gamma"] {
        storage
            .enqueue(&format!("{}/x/{}?ref=listing", base_url, name), "A")
            .unwrap();
    }

    let config = create_test_config(db_path.to_str().unwrap(), &base_url, None);
    let crawler = Crawler::new(
        storage.clone(),
        http_client(),
        config.crawler,
        vec!["A".to_string()],
    );

    let report = crawler.run_cycle().await.unwrap();
    assert_eq!(report.selected, 3);
    assert_eq!(report.fetched, 3);

    for name in ["alpha", "beta", "gamma"] {
        assert!(!storage.is_queued("A", &format!("/x/{}", name)).unwrap());
    }
    assert_eq!(storage.count_frontier(None).unwrap(), 0);

    let documents = storage.documents_for_source("A", 10).unwrap();
    assert_eq!(documents.len(), 3);
    for name in ["alpha", "beta", "gamma"] {
        let document = documents
            .iter()
            .find(|doc| doc.url.contains(&format!("/x/{}", name)))
            .expect("document for every entry");
        assert!(document.html.contains(&format!("<h1>{}</h1>", name)));
    }
}

#[tokio::test]
async fn test_unreachable_host_is_retried_next_cycle() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/x/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>back</p>"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    storage
        .enqueue(&format!("{}/x/flaky", base_url), "A")
        .unwrap();

    let config = create_test_config(db_path.to_str().unwrap(), &base_url, None);
    let crawler = Crawler::new(
        storage.clone(),
        http_client(),
        config.crawler,
        vec!["A".to_string()],
    );

    let first = crawler.run_cycle().await.unwrap();
    assert_eq!(first.failed, 1);
    assert!(storage.is_queued("A", "/x/flaky").unwrap());
    assert_eq!(storage.count_documents(None).unwrap(), 0);

    let second = crawler.run_cycle().await.unwrap();
    assert_eq!(second.fetched, 1);
    assert!(!storage.is_queued("A", "/x/flaky").unwrap());
    assert_eq!(storage.count_documents(Some("A")).unwrap(), 1);
}
