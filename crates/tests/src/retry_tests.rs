//! Retry behavior against mock HTTP sources: attempt counts, terminal
//! statuses, and the 404-as-zero rule.

use tally_core::config::AppConfig;
use tally_core::source::{GatewayClient, SourceError};

fn fast_config(gateway_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.sources.gateway_url = gateway_url.to_string();
    config.recon.retry_attempts = 3;
    // Keep backoff delays in the low milliseconds.
    config.recon.retry_delay_ms = 1;
    config
}

#[tokio::test]
async fn test_server_error_retried_until_exhaustion() {
    let mut server = mockito::Server::new_async().await;
    // Initial attempt plus three retries.
    let mock = server
        .mock("GET", "/pid~process@1.0/compute/balances/addr-1")
        .with_status(503)
        .with_body("unavailable")
        .expect(4)
        .create_async()
        .await;

    let client = GatewayClient::new(&fast_config(&server.url()), "pid").unwrap();
    let err = client.balance("addr-1").await.unwrap_err();
    assert!(matches!(err, SourceError::HttpStatus(503, _)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_retried_until_exhaustion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pid~process@1.0/compute/balances/addr-1")
        .with_status(429)
        .expect(4)
        .create_async()
        .await;

    let client = GatewayClient::new(&fast_config(&server.url()), "pid").unwrap();
    let err = client.balance("addr-1").await.unwrap_err();
    assert!(matches!(err, SourceError::RateLimited));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_never_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pid~process@1.0/compute/balances/addr-1")
        .with_status(400)
        .with_body("bad request")
        .expect(1)
        .create_async()
        .await;

    let client = GatewayClient::new(&fast_config(&server.url()), "pid").unwrap();
    let err = client.balance("addr-1").await.unwrap_err();
    assert!(matches!(err, SourceError::HttpStatus(400, _)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_definitive_zero() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pid~process@1.0/compute/balances/unseen")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = GatewayClient::new(&fast_config(&server.url()), "pid").unwrap();
    let balance = client.balance("unseen").await.unwrap();
    assert_eq!(balance, "0");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_retryable_error() {
    // Port 1 is never listening locally.
    let mut config = fast_config("http://127.0.0.1:1");
    config.recon.retry_attempts = 1;
    let client = GatewayClient::new(&config, "pid").unwrap();
    let err = client.balance("addr-1").await.unwrap_err();
    assert!(err.is_retryable(), "connection failure should be retryable: {err}");
}

#[tokio::test]
async fn test_success_body_needs_no_retry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/pid~process@1.0/compute/balances/addr-1")
        .with_status(200)
        .with_body("987654321")
        .expect(1)
        .create_async()
        .await;

    let client = GatewayClient::new(&fast_config(&server.url()), "pid").unwrap();
    assert_eq!(client.balance("addr-1").await.unwrap(), "987654321");
    mock.assert_async().await;
}
