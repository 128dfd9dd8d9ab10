//! Full dispatcher cycles against mock servers

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use webpage_analyzer::dispatcher::{spawn_dispatcher, CycleOutcome, Dispatcher};
use webpage_analyzer::fetcher::HttpFetcher;
use webpage_analyzer::state::CheckStatus;
use webpage_analyzer::storage::{SqliteStorage, Storage, UnreachableLink};
use webpage_analyzer::HtmlVersion;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::create_test_config;

struct Harness {
    _dir: TempDir,
    storage: Arc<SqliteStorage>,
    dispatcher: Dispatcher<SqliteStorage, HttpFetcher>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("results.db");
    let config = create_test_config(db_path.to_str().unwrap());

    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    let fetcher = HttpFetcher::new(&config.user_agent, &config.worker).unwrap();
    let dispatcher = Dispatcher::new(Arc::clone(&storage), fetcher, &config.worker);

    Harness {
        _dir: dir,
        storage,
        dispatcher,
    }
}

#[tokio::test]
async fn test_page_404_ends_in_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let h = harness();
    let url = format!("{}/a", mock_server.uri());
    let id = h.storage.submit_urls(&[url.clone()]).unwrap()[0];

    let outcome = h.dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Failed { id, status_code: 404 });

    let record = h.storage.get_record(id).unwrap();
    assert_eq!(record.status, CheckStatus::Error);
    assert!(record.checked_at.is_some());
    assert_eq!(record.unreachable_link_count, 1);
    assert_eq!(record.unreachable_links, vec![UnreachableLink::new(url, 404)]);
}

#[tokio::test]
async fn test_page_with_links_is_checked() {
    let site = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">
                    <html><head><title>Home</title></head><body>
                    <h1>Welcome</h1><h2>News</h2><h2>Links</h2>
                    <a href="/ok">fine</a>
                    <a href="/fail">broken</a>
                    <a href="{}/">elsewhere</a>
                    <a href="mailto:someone@example.com">mail</a>
                    <form action="/login"><input type="text" name="user"><input type="PASSWORD" name="pw"></form>
                    </body></html>"#,
                    elsewhere.uri()
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&site)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/fail"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&elsewhere)
        .await;

    let h = harness();
    let url = format!("{}/", site.uri());
    let id = h.storage.submit_urls(&[url]).unwrap()[0];

    assert_eq!(
        h.dispatcher.run_cycle().await.unwrap(),
        CycleOutcome::Checked { id }
    );

    let record = h.storage.get_record(id).unwrap();
    assert_eq!(record.status, CheckStatus::Checked);
    assert_eq!(record.title, "Home");
    assert_eq!(record.html_version, Some(HtmlVersion::Html401));
    assert_eq!(record.headings.as_array(), [1, 2, 0, 0, 0, 0]);
    // mailto: has no host, so it counts as internal, but it is never probed
    assert_eq!(record.internal_link_count, 3);
    assert_eq!(record.external_link_count, 1);
    assert!(record.has_login_form);
    assert_eq!(record.unreachable_link_count, 1);
    assert_eq!(
        record.unreachable_links,
        vec![UnreachableLink::new(format!("{}/fail", site.uri()), 500)]
    );

    assert_eq!(h.dispatcher.run_cycle().await.unwrap(), CycleOutcome::Idle);
}

#[tokio::test]
async fn test_spawned_dispatcher_processes_queue_and_stops() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>One</title>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("results.db");
    let config = create_test_config(db_path.to_str().unwrap());
    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());

    let handle = spawn_dispatcher(Arc::clone(&storage), &config).unwrap();

    let ids = storage
        .submit_urls(&[
            format!("{}/one", mock_server.uri()),
            format!("{}/two", mock_server.uri()),
        ])
        .unwrap();

    let mut done = false;
    for _ in 0..200 {
        let statuses: Vec<CheckStatus> = ids
            .iter()
            .map(|id| storage.get_record(*id).unwrap().status)
            .collect();
        if statuses == [CheckStatus::Checked, CheckStatus::Error] {
            done = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(done, "dispatcher did not finish both records");

    assert_eq!(storage.get_record(ids[0]).unwrap().title, "One");
    assert_eq!(
        storage.get_record(ids[1]).unwrap().unreachable_links[0].status_code,
        503
    );

    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_stranded_pending_is_recovered_after_restart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Later</title>"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("results.db");
    let url = format!("{}/later", mock_server.uri());

    // A previous process claimed the record and died
    let id = {
        let storage = SqliteStorage::new(&db_path).unwrap();
        let id = storage.submit_urls(&[url.clone()]).unwrap()[0];
        storage.claim_record(id, &url).unwrap();
        id
    };

    let config = create_test_config(db_path.to_str().unwrap());
    let storage = Arc::new(SqliteStorage::new(&db_path).unwrap());
    let fetcher = HttpFetcher::new(&config.user_agent, &config.worker).unwrap();
    let dispatcher = Dispatcher::new(Arc::clone(&storage), fetcher, &config.worker);

    assert_eq!(dispatcher.run_cycle().await.unwrap(), CycleOutcome::Idle);

    assert_eq!(storage.requeue_stranded().unwrap(), 1);
    assert_eq!(
        dispatcher.run_cycle().await.unwrap(),
        CycleOutcome::Checked { id }
    );
    assert_eq!(storage.get_record(id).unwrap().title, "Later");
}
