use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tally_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod progress;
mod reporter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Reconciles ledger process balances across sources", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (console, json, csv)
    #[arg(short, long, global = true, default_value = "console")]
    output: String,

    /// Output file path, for json and csv formats
    #[arg(short, long, global = true)]
    file: Option<String>,

    /// Maximum in-flight source requests
    #[arg(short, long, global = true)]
    concurrency: Option<usize>,

    /// Disable the progress bar
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a dry-run baseline against the gateway, address by address
    Check {
        /// Process identifier (43-character base64url)
        process_id: String,

        /// Check at most this many addresses
        #[arg(long)]
        max_addresses: Option<usize>,

        /// Mark failed fetches unknown instead of treating them as zero
        #[arg(long)]
        mark_unknown: bool,
    },

    /// Reconcile an evaluated message's balances against the gateway
    Manual {
        /// Process identifier (43-character base64url)
        process_id: String,

        /// Identifier of the already evaluated message
        message_id: String,

        /// Check at most this many addresses
        #[arg(long)]
        max_addresses: Option<usize>,

        /// Mark failed fetches unknown instead of treating them as zero
        #[arg(long)]
        mark_unknown: bool,
    },

    /// Reconcile a baseline loaded from a JSON file against the gateway
    FromFile {
        /// Process identifier (43-character base64url)
        process_id: String,

        /// JSON file of the form {"address": "balance", ...}
        file: String,

        /// Check at most this many addresses
        #[arg(long)]
        max_addresses: Option<usize>,

        /// Mark failed fetches unknown instead of treating them as zero
        #[arg(long)]
        mark_unknown: bool,
    },

    /// Compare an evaluated message result between two compute units
    CuCompare {
        /// Process identifier (43-character base64url)
        process_id: String,

        /// Identifier of the already evaluated message
        #[arg(long)]
        message_id: String,

        /// Override the first compute-unit URL
        #[arg(long)]
        cu_a: Option<String>,

        /// Override the second compute-unit URL
        #[arg(long)]
        cu_b: Option<String>,
    },
}

fn init_logging(config: &AppConfig, verbose: u8) {
    let default_level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr so report output on stdout stays machine-readable.
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => AppConfig::load().context("failed to load configuration")?,
    };

    init_logging(&config, cli.verbose);

    let output = reporter::OutputTarget::new(&cli.output, cli.file.clone())?;
    let show_progress = !cli.no_progress && cli.output.eq_ignore_ascii_case("console");

    let exit_code = match cli.command {
        Commands::Check {
            process_id,
            max_addresses,
            mark_unknown,
        } => {
            commands::check::run(commands::check::CheckArgs {
                config,
                process_id,
                baseline: commands::check::Baseline::DryRun,
                concurrency: cli.concurrency,
                max_addresses,
                mark_unknown,
                output,
                show_progress,
            })
            .await?
        }
        Commands::Manual {
            process_id,
            message_id,
            max_addresses,
            mark_unknown,
        } => {
            commands::check::run(commands::check::CheckArgs {
                config,
                process_id,
                baseline: commands::check::Baseline::MessageResult { message_id },
                concurrency: cli.concurrency,
                max_addresses,
                mark_unknown,
                output,
                show_progress,
            })
            .await?
        }
        Commands::FromFile {
            process_id,
            file,
            max_addresses,
            mark_unknown,
        } => {
            commands::check::run(commands::check::CheckArgs {
                config,
                process_id,
                baseline: commands::check::Baseline::File { path: file.into() },
                concurrency: cli.concurrency,
                max_addresses,
                mark_unknown,
                output,
                show_progress,
            })
            .await?
        }
        Commands::CuCompare {
            process_id,
            message_id,
            cu_a,
            cu_b,
        } => {
            commands::cu_compare::run(commands::cu_compare::CuCompareArgs {
                config,
                process_id,
                message_id,
                cu_a,
                cu_b,
                output,
            })
            .await?
        }
    };

    std::process::exit(exit_code);
}
