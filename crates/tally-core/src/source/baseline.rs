//! Baseline acquisition: where the reference balance map comes from.

use crate::config::AppConfig;
use crate::source::compute::ComputeClient;
use crate::source::errors::SourceError;
use crate::source::parse_balance_map;
use crate::types::BalanceMap;
use std::path::{Path, PathBuf};

/// Where to get the baseline balance map for a run.
#[derive(Debug, Clone)]
pub enum BaselineSource {
    /// Evaluate a `Balances` dry-run against live process state.
    DryRun,
    /// Read the output of an already evaluated message.
    MessageResult { message_id: String },
    /// Load a JSON balance object from disk.
    File { path: PathBuf },
}

/// Acquires the baseline balance map.
///
/// Unlike per-address counterpart fetches, a baseline failure is fatal:
/// without a reference map there is nothing to reconcile against.
pub async fn load_baseline(
    source: &BaselineSource,
    config: &AppConfig,
    process_id: &str,
) -> Result<BalanceMap, SourceError> {
    match source {
        BaselineSource::DryRun => {
            let client = ComputeClient::new(config, &config.sources.cu_url)?;
            client.dry_run_balances(process_id).await
        }
        BaselineSource::MessageResult { message_id } => {
            let client = ComputeClient::new(config, &config.sources.cu_url)?;
            let balances = client.result_balances(message_id, process_id).await?;
            if balances.is_empty() {
                return Err(SourceError::EmptyBaseline);
            }
            Ok(balances)
        }
        BaselineSource::File { path } => balances_from_file(path),
    }
}

/// Reads a balance map from a JSON file of the form
/// `{"address": "balance", ...}`.
pub fn balances_from_file(path: &Path) -> Result<BalanceMap, SourceError> {
    let contents = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| SourceError::InvalidResponse(format!("{}: {e}", path.display())))?;
    let balances = parse_balance_map(&value)?;
    if balances.is_empty() {
        return Err(SourceError::EmptyBaseline);
    }
    Ok(balances)
}
