// tests/fetch_http.rs
use std::time::Duration;

use policy_feed::ingest::run_once;
use policy_feed::{FeedConfig, HttpFetcher, SourceError, SourceFetcher, REPORT_TZ};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new()
        .unwrap()
        .with_timeout(5)
        .with_retries(2)
        .with_backoff(Duration::from_millis(1))
}

#[tokio::test]
async fn ok_response_returns_body() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body("<rss><channel/></rss>")
        .create_async()
        .await;

    let body = fetcher().fetch(&format!("{}/feed.xml", server.url())).await.unwrap();
    assert_eq!(body, "<rss><channel/></rss>");
    m.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/flaky")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let err = fetcher().fetch(&format!("{}/flaky", server.url())).await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 503, .. }), "{err}");
    m.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/gone")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let err = fetcher().fetch(&format!("{}/gone", server.url())).await.unwrap_err();
    assert!(matches!(err, SourceError::Status { status: 404, .. }), "{err}");
    m.assert_async().await;
}

#[tokio::test]
async fn run_once_over_http_keeps_good_sources() {
    let mut server = mockito::Server::new_async().await;
    let _rss = server
        .mock("GET", "/press.xml")
        .with_status(200)
        .with_body(include_str!("fixtures/press_release_rss.xml"))
        .create_async()
        .await;
    let _ics = server
        .mock("GET", "/hearings.ics")
        .with_status(200)
        .with_header("content-type", "text/calendar")
        .with_body(include_str!("fixtures/hearings.ics"))
        .create_async()
        .await;
    let _bad = server
        .mock("GET", "/missing.xml")
        .with_status(404)
        .create_async()
        .await;

    let cfg = FeedConfig {
        title: "Test".into(),
        press_releases: vec![
            format!("{}/press.xml", server.url()),
            format!("{}/missing.xml", server.url()),
        ],
        hearings: vec![format!("{}/hearings.ics", server.url())],
    };

    let outcome = run_once(&fetcher(), &cfg, REPORT_TZ).await;
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].url.ends_with("/missing.xml"));
    assert_eq!(outcome.items.len(), 5 + 3);
    assert_eq!(outcome.dropped, 2);
}
