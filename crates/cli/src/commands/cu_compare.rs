//! Two-source comparison: the same evaluated message fetched from two
//! compute units, compared over the union of reported addresses.

use crate::reporter::OutputTarget;
use anyhow::{Context, Result};
use tally_core::config::AppConfig;
use tally_core::recon::union;
use tally_core::source::compute::{validate_message_id, validate_process_id, ComputeClient};

pub struct CuCompareArgs {
    pub config: AppConfig,
    pub process_id: String,
    pub message_id: String,
    pub cu_a: Option<String>,
    pub cu_b: Option<String>,
    pub output: OutputTarget,
}

pub async fn run(args: CuCompareArgs) -> Result<i32> {
    let CuCompareArgs {
        config,
        process_id,
        message_id,
        cu_a,
        cu_b,
        output,
    } = args;

    validate_process_id(&process_id)?;
    validate_message_id(&message_id)?;

    let url_a = cu_a.unwrap_or_else(|| config.sources.cu_url_a.clone());
    let url_b = cu_b.unwrap_or_else(|| config.sources.cu_url_b.clone());

    tracing::info!(cu_a = %url_a, cu_b = %url_b, message_id = %message_id, "fetching message result from both compute units");

    let client_a = ComputeClient::new(&config, &url_a)?;
    let client_b = ComputeClient::new(&config, &url_b)?;

    let (map_a, map_b) = tokio::try_join!(
        client_a.result_balances(&message_id, &process_id),
        client_b.result_balances(&message_id, &process_id),
    )
    .context("failed to fetch message result")?;

    tracing::info!(
        addresses_a = map_a.len(),
        addresses_b = map_b.len(),
        "comparing balance maps"
    );

    let comparisons = union::compare_maps(&map_a, &map_b);
    let report = union::generate_report(comparisons, &process_id, &message_id, &url_a, &url_b);

    output.emit_union_report(&report)?;

    if report.mismatch_count > 0 || report.only_in_a > 0 || report.only_in_b > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
