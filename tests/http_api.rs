//! End-to-end tests of the JSON endpoints, driven through the axum router
//! with `tower::ServiceExt::oneshot`.

mod helpers;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use helpers::{scanner_with_store, FakeFetcher};
use tls_checker::{server, MemoryResultStore, ResultStore, Verdict};

struct TestApp {
    router: axum::Router,
    store: Arc<MemoryResultStore>,
    fetcher: Arc<FakeFetcher>,
}

fn app() -> TestApp {
    let store = Arc::new(MemoryResultStore::new());
    let (scanner, fetcher) = scanner_with_store(
        Arc::clone(&store) as Arc<dyn ResultStore>,
        vec!["https://api.example.com".to_string()],
    );
    TestApp {
        router: server::router(Arc::new(scanner)),
        store,
        fetcher,
    }
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("request should complete");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, json)
}

fn post_batch(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/tls-checker/process-batch")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

#[tokio::test]
async fn test_empty_batch_is_rejected_without_scanning() {
    let app = app();

    for body in [
        r#"{"urls": []}"#,
        r#"{}"#,
        r#"{"urls": "https://example.com"}"#,
        r#"{"urls": null}"#,
        "not json",
        "",
    ] {
        let (status, json) = send(&app.router, post_batch(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["error"], "No URLs provided for scanning.");
    }

    assert_eq!(app.fetcher.calls(), 0);
    assert!(app.store.get_all().await.expect("query").is_empty());
    assert!(app.store.batches().await.is_empty());
}

#[tokio::test]
async fn test_mixed_batch_reports_request_count() {
    let app = app();

    let (status, json) = send(
        &app.router,
        post_batch(
            r#"{"urls": ["https://good.example.com", "ht!tp://bad url", "https://expired.example.com"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["processed"], 3);
    assert_eq!(app.fetcher.calls(), 2);

    let good = app
        .store
        .get_by_url("https://good.example.com")
        .await
        .expect("query")
        .expect("stored");
    assert_eq!(good.verdict, Verdict::Valid);

    let bad = app
        .store
        .get_by_url("ht!tp://bad url")
        .await
        .expect("query")
        .expect("stored");
    assert_eq!(bad.verdict, Verdict::UnknownError);
    assert!(bad.detail.starts_with("malformed URL"));

    let expired = app
        .store
        .get_by_url("https://expired.example.com")
        .await
        .expect("query")
        .expect("stored");
    assert_eq!(expired.verdict, Verdict::Expired);
}

#[tokio::test]
async fn test_processed_counts_duplicates() {
    let app = app();
    let (status, json) = send(
        &app.router,
        post_batch(r#"{"urls": ["https://good.example.com", "https://good.example.com"]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["processed"], 2);
    assert_eq!(app.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_scan_results_endpoint() {
    let app = app();
    send(
        &app.router,
        post_batch(
            r#"{"urls": ["https://untrusted.example.com", "https://mismatch.example.com", "https://down.example.com"]}"#,
        ),
    )
    .await;

    let (status, json) = send(&app.router, get("/tls-checker/scan-results")).await;
    assert_eq!(status, StatusCode::OK);

    let results = json.as_array().expect("array of results");
    assert_eq!(results.len(), 3);
    // Ordered by URL
    assert_eq!(results[0]["url"], "https://down.example.com");
    assert_eq!(results[0]["verdict"], "CONNECTION_FAILED");
    assert!(results[0]["certificate"].is_null());
    assert_eq!(results[1]["verdict"], "HOSTNAME_MISMATCH");
    assert_eq!(results[2]["verdict"], "UNTRUSTED_CHAIN");
    assert_eq!(results[2]["certificate"]["chain_trust"]["status"], "untrusted");

    // Reading again gives the same answer
    let (_, again) = send(&app.router, get("/tls-checker/scan-results")).await;
    assert_eq!(json, again);
}

#[tokio::test]
async fn test_urls_to_scan_endpoint() {
    let app = app();
    let (status, json) = send(&app.router, get("/tls-checker/urls-to-scan")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({"urls_to_scan": ["https://api.example.com"]})
    );
}
