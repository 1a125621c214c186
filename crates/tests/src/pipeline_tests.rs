//! End-to-end reconciliation runs against mock compute units and gateways.

use serde_json::json;
use tally_core::config::AppConfig;
use tally_core::recon::{self, NoopProgress, Scheduler};
use tally_core::source::{load_baseline, BaselineSource, ComputeClient, GatewayClient};
use tally_core::types::Outcome;

const PID: &str = "0000000000000000000000000000000000000pid43x";
const MID: &str = "0000000000000000000000000000000000000msg43x";

fn config(cu_url: &str, gateway_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.sources.cu_url = cu_url.to_string();
    config.sources.gateway_url = gateway_url.to_string();
    config.recon.retry_delay_ms = 1;
    config.recon.concurrency = 4;
    config
}

fn cu_body(balances: serde_json::Value) -> String {
    json!({ "Messages": [{ "Data": balances.to_string() }] }).to_string()
}

async fn mock_gateway_balance(server: &mut mockito::Server, address: &str, body: &str) {
    server
        .mock(
            "GET",
            format!("/{PID}~process@1.0/compute/balances/{address}").as_str(),
        )
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
}

/// Runs the full pipeline: dry-run baseline, concurrent gateway fetches,
/// aggregated report.
async fn reconcile(config: &AppConfig) -> tally_core::types::Report {
    let baseline = load_baseline(&BaselineSource::DryRun, config, PID)
        .await
        .unwrap();
    let addresses = recon::extract_addresses(&baseline);

    let gateway = GatewayClient::new(config, PID).unwrap();
    let scheduler = Scheduler::new(config.recon.concurrency).with_fallback(config.recon.fallback);

    let comparisons = scheduler
        .run(
            &baseline,
            addresses,
            |address| {
                let gateway = gateway.clone();
                async move { gateway.balance(&address).await }
            },
            &NoopProgress,
        )
        .await;

    recon::generate_report(comparisons, PID)
}

#[tokio::test]
async fn test_fully_matching_run() {
    let mut cu = mockito::Server::new_async().await;
    let mut gateway = mockito::Server::new_async().await;

    cu.mock("POST", format!("/dry-run?process-id={PID}").as_str())
        .with_status(200)
        .with_body(cu_body(json!({"alice": "100", "bob": "250"})))
        .create_async()
        .await;
    mock_gateway_balance(&mut gateway, "alice", "100").await;
    mock_gateway_balance(&mut gateway, "bob", "250").await;

    let report = reconcile(&config(&cu.url(), &gateway.url())).await;

    assert_eq!(report.total_addresses, 2);
    assert_eq!(report.matching_count, 2);
    assert_eq!(report.mismatch_count, 0);
    assert_eq!(report.unknown_count, 0);
    assert_eq!(report.accuracy_percentage, 100.0);
    assert_eq!(report.total_discrepancy, "0");
}

#[tokio::test]
async fn test_mismatches_reported_with_exact_differences() {
    let mut cu = mockito::Server::new_async().await;
    let mut gateway = mockito::Server::new_async().await;

    cu.mock("POST", format!("/dry-run?process-id={PID}").as_str())
        .with_status(200)
        .with_body(cu_body(json!({
            "alice": "1000",
            "bob": "2000",
            "carol": "123456789012345678901234567890",
        })))
        .create_async()
        .await;
    mock_gateway_balance(&mut gateway, "alice", "1000").await;
    mock_gateway_balance(&mut gateway, "bob", "1900").await;
    mock_gateway_balance(&mut gateway, "carol", "123456789012345678901234567880").await;

    let report = reconcile(&config(&cu.url(), &gateway.url())).await;

    assert_eq!(report.matching_count, 1);
    assert_eq!(report.mismatch_count, 2);
    assert_eq!(report.accuracy_percentage, 33.33);
    // |2000-1900| + |...890 - ...880|
    assert_eq!(report.total_discrepancy, "110");

    let bob = report
        .mismatches
        .iter()
        .find(|c| c.address == "bob")
        .unwrap();
    assert_eq!(bob.difference.as_deref(), Some("100"));
}

#[tokio::test]
async fn test_gateway_failure_falls_back_to_zero() {
    let mut cu = mockito::Server::new_async().await;
    let mut gateway = mockito::Server::new_async().await;

    cu.mock("POST", format!("/dry-run?process-id={PID}").as_str())
        .with_status(200)
        .with_body(cu_body(json!({"alice": "100", "bob": "0"})))
        .create_async()
        .await;
    mock_gateway_balance(&mut gateway, "bob", "0").await;
    // alice consistently errors and exhausts her retries
    gateway
        .mock(
            "GET",
            format!("/{PID}~process@1.0/compute/balances/alice").as_str(),
        )
        .with_status(500)
        .create_async()
        .await;

    let report = reconcile(&config(&cu.url(), &gateway.url())).await;

    assert_eq!(report.total_addresses, 2);
    assert_eq!(report.mismatch_count, 1);
    let alice = &report.mismatches[0];
    assert_eq!(alice.address, "alice");
    assert_eq!(alice.counterpart_balance.as_deref(), Some("0"));
    assert_eq!(alice.difference.as_deref(), Some("100"));
}

#[tokio::test]
async fn test_missing_gateway_state_counts_as_zero() {
    let mut cu = mockito::Server::new_async().await;
    let mut gateway = mockito::Server::new_async().await;

    cu.mock("POST", format!("/dry-run?process-id={PID}").as_str())
        .with_status(200)
        .with_body(cu_body(json!({"alice": "0", "bob": "5"})))
        .create_async()
        .await;
    // The gateway has never seen either address.
    gateway
        .mock(
            "GET",
            mockito::Matcher::Regex(r"^/.*/compute/balances/.*$".to_string()),
        )
        .with_status(404)
        .create_async()
        .await;

    let report = reconcile(&config(&cu.url(), &gateway.url())).await;

    // Zero baseline matches the definitive 404 zero; nonzero mismatches.
    assert_eq!(report.matching_count, 1);
    assert_eq!(report.mismatch_count, 1);
    assert_eq!(report.mismatches[0].address, "bob");
}

#[tokio::test]
async fn test_empty_baseline_is_fatal() {
    let mut cu = mockito::Server::new_async().await;
    cu.mock("POST", format!("/dry-run?process-id={PID}").as_str())
        .with_status(200)
        .with_body(cu_body(json!({})))
        .create_async()
        .await;

    let config = config(&cu.url(), "http://127.0.0.1:1");
    let result = load_baseline(&BaselineSource::DryRun, &config, PID).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_two_source_union_comparison() {
    let mut cu_a = mockito::Server::new_async().await;
    let mut cu_b = mockito::Server::new_async().await;
    let result_path = format!("/result/{MID}?process-id={PID}");

    cu_a.mock("GET", result_path.as_str())
        .with_status(200)
        .with_body(cu_body(json!({
            "common-match": "10",
            "common-diff": "500",
            "gap-a": "1",
        })))
        .create_async()
        .await;
    cu_b.mock("GET", result_path.as_str())
        .with_status(200)
        .with_body(cu_body(json!({
            "common-match": "10",
            "common-diff": "450",
            "gap-b": "2",
        })))
        .create_async()
        .await;

    let config = config(&cu_a.url(), "http://127.0.0.1:1");
    let client_a = ComputeClient::new(&config, &cu_a.url()).unwrap();
    let client_b = ComputeClient::new(&config, &cu_b.url()).unwrap();

    let (map_a, map_b) = tokio::try_join!(
        client_a.result_balances(MID, PID),
        client_b.result_balances(MID, PID),
    )
    .unwrap();

    let comparisons = recon::union::compare_maps(&map_a, &map_b);
    let report =
        recon::union::generate_report(comparisons, PID, MID, &cu_a.url(), &cu_b.url());

    assert_eq!(report.common_addresses, 2);
    assert_eq!(report.only_in_a, 1);
    assert_eq!(report.only_in_b, 1);
    assert_eq!(report.matching_count, 1);
    assert_eq!(report.mismatch_count, 1);
    assert_eq!(report.accuracy_percentage, 50.0);
    assert_eq!(report.total_discrepancy, "50");
    assert!(report
        .unique_to_a
        .iter()
        .all(|c| c.outcome == Outcome::Unknown && c.only_in_a));
}
