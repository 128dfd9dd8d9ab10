//! `/links` API routes driven through the router without a socket

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use webpage_analyzer::analyzer::{HeadingCounts, PageMetrics};
use webpage_analyzer::config::ServerConfig;
use webpage_analyzer::server::{create_router, AppState};
use webpage_analyzer::state::CheckStatus;
use webpage_analyzer::storage::{CheckUpdate, SqliteStorage, Storage, UnreachableLink};
use webpage_analyzer::HtmlVersion;

fn setup() -> (Arc<SqliteStorage>, Router) {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let state = AppState::new(storage.clone(), &ServerConfig::default()).unwrap();
    (storage, create_router(state))
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn checked_metrics() -> PageMetrics {
    PageMetrics {
        title: "Checked".to_string(),
        html_version: HtmlVersion::Html5,
        headings: HeadingCounts::from_counts([1, 1, 0, 0, 0, 0]),
        internal_links: 3,
        external_links: 1,
        unreachable_links: vec![UnreachableLink::new("https://example.test/x", 500)],
        has_login_form: false,
    }
}

/// Runs a record through claim and commit the way the dispatcher does
fn mark_checked(storage: &SqliteStorage, id: i64) {
    storage.claim_record(id, "https://example.test/").unwrap();
    storage
        .commit_check(
            id,
            &CheckUpdate::checked("https://example.test/", checked_metrics(), Utc::now()),
        )
        .unwrap();
}

#[tokio::test]
async fn test_add_links_queues_records() {
    let (storage, app) = setup();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/links",
            r#"{"urls": ["https://a.test/", "https://b.test/"]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "added for analysis"}));

    let page = storage.list_records(10, 1).unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page
        .records
        .iter()
        .all(|record| record.status == CheckStatus::Created));
}

#[tokio::test]
async fn test_add_links_rejects_bad_input() {
    let (storage, app) = setup();

    for body in [
        r#"{"urls": []}"#,
        r#"{}"#,
        r#"{"urls": ["https://a.test/", "  "]}"#,
        r#"{"urls": "https://a.test/"}"#,
        "not json",
    ] {
        let (status, response) = send(&app, json_request("POST", "/links", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(response["error"], "Invalid JSON or missing URLs");
    }

    assert_eq!(storage.list_records(10, 1).unwrap().total_count, 0);
}

#[tokio::test]
async fn test_list_links_paginates() {
    let (storage, app) = setup();
    let urls: Vec<String> = (1..=15).map(|i| format!("https://site{}.test/", i)).collect();
    let ids = storage.submit_urls(&urls).unwrap();

    let (status, body) = send(&app, get("/links?amount=10&page=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({"current_page": 2, "page_size": 10, "total_count": 15})
    );
    let listed: Vec<i64> = body["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, ids[10..].to_vec());
    assert_eq!(body["links"][0]["status"], "created");
    assert_eq!(body["links"][0]["url"], "https://site11.test/");
    // Not checked yet: no check time and no version
    assert!(body["links"][0].get("check_time").is_none());
    assert!(body["links"][0].get("html_version").is_none());
}

#[tokio::test]
async fn test_list_links_defaults() {
    let (storage, app) = setup();
    let urls: Vec<String> = (1..=12).map(|i| format!("https://site{}.test/", i)).collect();
    storage.submit_urls(&urls).unwrap();

    let (status, body) = send(&app, get("/links")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["links"].as_array().unwrap().len(), 10);
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["page_size"], 10);
}

#[tokio::test]
async fn test_list_links_rejects_invalid_params() {
    let (_, app) = setup();

    for uri in ["/links?amount=0", "/links?amount=abc", "/links?amount=101"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(body["error"], "Invalid amount parameter");
    }

    for uri in ["/links?page=0", "/links?page=-1"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(body["error"], "Invalid page parameter");
    }
}

#[tokio::test]
async fn test_list_links_shows_metrics_and_details() {
    let (storage, app) = setup();
    let id = storage
        .submit_urls(&["https://example.test/".to_string()])
        .unwrap()[0];
    mark_checked(&storage, id);

    let (_, body) = send(&app, get("/links")).await;
    let link = &body["links"][0];

    assert_eq!(link["status"], "checked");
    assert_eq!(link["title"], "Checked");
    assert_eq!(link["html_version"], "HTML5");
    assert_eq!(link["headings_count"]["h2"], 1);
    assert_eq!(link["internal_links"], 3);
    assert_eq!(link["external_links"], 1);
    assert_eq!(link["inaccessible_links"], 1);
    assert_eq!(
        link["inaccessible_details"],
        json!([{"url": "https://example.test/x", "status_code": 500}])
    );
    assert!(link["check_time"].is_string());
}

#[tokio::test]
async fn test_update_link_to_stop_keeps_metrics() {
    let (storage, app) = setup();
    let id = storage
        .submit_urls(&["https://example.test/".to_string()])
        .unwrap()[0];
    mark_checked(&storage, id);

    let (status, body) = send(
        &app,
        json_request("PUT", "/links", &json!({"id": id, "status": "stop"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Link status updated successfully", "id": id, "status": "stop"})
    );

    let record = storage.get_record(id).unwrap();
    assert_eq!(record.status, CheckStatus::Stop);
    assert_eq!(record.title, "Checked");
    assert_eq!(record.unreachable_link_count, 1);
    assert_eq!(record.unreachable_links.len(), 1);
}

#[tokio::test]
async fn test_update_link_errors() {
    let (storage, app) = setup();
    let id = storage
        .submit_urls(&["https://example.test/".to_string()])
        .unwrap()[0];

    let (status, body) = send(
        &app,
        json_request("PUT", "/links", &json!({"id": id, "status": "checked"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Status must be either 'stop' or 'pending'");

    let (status, body) = send(&app, json_request("PUT", "/links", r#"{"status": "stop"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format");

    let (status, body) = send(
        &app,
        json_request("PUT", "/links", r#"{"id": 9999, "status": "pending"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Record not found");

    assert_eq!(storage.get_record(id).unwrap().status, CheckStatus::Created);
}

#[tokio::test]
async fn test_update_link_pending_requeues() {
    let (storage, app) = setup();
    let id = storage
        .submit_urls(&["https://example.test/".to_string()])
        .unwrap()[0];
    mark_checked(&storage, id);
    assert!(storage.next_eligible().unwrap().is_none());

    let (status, _) = send(
        &app,
        json_request("PUT", "/links", &json!({"id": id, "status": "pending"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(storage.next_eligible().unwrap().map(|queued| queued.id), Some(id));
}

#[tokio::test]
async fn test_delete_link() {
    let (storage, app) = setup();
    let id = storage
        .submit_urls(&["https://example.test/".to_string()])
        .unwrap()[0];

    let delete = |id: i64| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/links/{}", id))
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, delete(id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(storage.get_record(id).unwrap_err().is_not_found());

    let (status, body) = send(&app, delete(id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Record not found");
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let (_, app) = setup();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/links")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let headers = response.headers();

    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    assert_eq!(headers.get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "43200");
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let (_, app) = setup();

    let request = Request::builder()
        .uri("/links")
        .header(header::ORIGIN, "http://evil.test")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
