//! HTTP fetcher behavior against a mock server

use webcrawl::{FetchError, Fetcher, HttpFetcher, USER_AGENT};

#[tokio::test]
async fn sends_the_compat_user_agent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_header("user-agent", USER_AGENT)
        .with_body("<html></html>")
        .create_async()
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let body = fetcher.fetch(&server.url()).await.unwrap();
    assert_eq!(body, "<html></html>");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_is_a_bad_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing")
        .with_status(503)
        .create_async()
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing", server.url()))
        .await
        .unwrap_err();
    match err {
        FetchError::BadResponse(status) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected a bad response, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_failures_are_transport_errors() {
    // Port 9 (discard) is about as unlistened as it gets.
    let fetcher = HttpFetcher::new().unwrap();
    let err = fetcher.fetch("http://127.0.0.1:9/").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
