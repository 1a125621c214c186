//! Single-gateway reconciliation: a baseline balance map checked against
//! per-address gateway fetches.

use crate::progress::ConsoleProgress;
use crate::reporter::OutputTarget;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tally_core::config::AppConfig;
use tally_core::recon::{self, FallbackPolicy, NoopProgress, ProgressObserver, Scheduler};
use tally_core::source::compute::validate_process_id;
use tally_core::source::{load_baseline, BaselineSource, GatewayClient};

/// Where the baseline of a check run comes from.
pub enum Baseline {
    /// Dry-run the `Balances` query against live process state.
    DryRun,
    /// Use the output of an already evaluated message.
    MessageResult { message_id: String },
    /// Load the balance map from a JSON file.
    File { path: PathBuf },
}

impl Baseline {
    fn source(self) -> BaselineSource {
        match self {
            Baseline::DryRun => BaselineSource::DryRun,
            Baseline::MessageResult { message_id } => {
                BaselineSource::MessageResult { message_id }
            }
            Baseline::File { path } => BaselineSource::File { path },
        }
    }
}

pub struct CheckArgs {
    pub config: AppConfig,
    pub process_id: String,
    pub baseline: Baseline,
    pub concurrency: Option<usize>,
    pub max_addresses: Option<usize>,
    pub mark_unknown: bool,
    pub output: OutputTarget,
    pub show_progress: bool,
}

pub async fn run(args: CheckArgs) -> Result<i32> {
    let CheckArgs {
        mut config,
        process_id,
        baseline,
        concurrency,
        max_addresses,
        mark_unknown,
        output,
        show_progress,
    } = args;

    validate_process_id(&process_id)?;
    if let Some(c) = concurrency {
        config.recon.concurrency = c;
    }
    if let Some(m) = max_addresses {
        config.recon.max_addresses = Some(m);
    }
    if mark_unknown {
        config.recon.fallback = FallbackPolicy::MarkUnknown;
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    tracing::info!(process_id = %process_id, "acquiring baseline");
    let baseline_map = load_baseline(&baseline.source(), &config, &process_id)
        .await
        .context("baseline acquisition failed")?;

    let mut addresses = recon::extract_addresses(&baseline_map);
    let total_known = addresses.len();
    if let Some(max) = config.recon.max_addresses {
        addresses.truncate(max);
    }
    tracing::info!(
        checking = addresses.len(),
        total = total_known,
        concurrency = config.recon.concurrency,
        "starting reconciliation"
    );

    let gateway = GatewayClient::new(&config, &process_id)?;
    let scheduler =
        Scheduler::new(config.recon.concurrency).with_fallback(config.recon.fallback);

    let progress: Box<dyn ProgressObserver> = if show_progress {
        Box::new(ConsoleProgress::new())
    } else {
        Box::new(NoopProgress)
    };

    let comparisons = scheduler
        .run(
            &baseline_map,
            addresses,
            |address| {
                let gateway = gateway.clone();
                async move { gateway.balance(&address).await }
            },
            progress.as_ref(),
        )
        .await;

    let mut report = recon::generate_report(comparisons, &process_id);
    report.mismatches.sort_by(|a, b| a.address.cmp(&b.address));
    report.matches.sort_by(|a, b| a.address.cmp(&b.address));
    report.unknowns.sort_by(|a, b| a.address.cmp(&b.address));

    output.emit_report(&report)?;

    if report.mismatch_count > 0 || report.unknown_count > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
