//! Layered configuration: built-in defaults, optional TOML file, then
//! `TALLY__`-prefixed environment variables.

use crate::recon::scheduler::FallbackPolicy;
use crate::recon::retry::RetryPolicy;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub recon: ReconConfig,
    pub logging: LoggingConfig,
}

/// Endpoints of the balance sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Compute-unit endpoint used for dry-run and result queries.
    pub cu_url: String,
    /// State-compute gateway serving per-address balances.
    pub gateway_url: String,
    /// First compute unit in two-source comparisons.
    pub cu_url_a: String,
    /// Second compute unit in two-source comparisons.
    pub cu_url_b: String,
}

/// Tunables for the reconciliation run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Maximum in-flight counterpart fetches.
    pub concurrency: usize,
    /// Retries per failed source operation, beyond the initial attempt.
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds.
    pub retry_delay_ms: u64,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Optional cap on the number of addresses checked per run.
    pub max_addresses: Option<usize>,
    /// How a per-address fetch failure is folded into the report.
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Either "pretty" or "json".
    pub format: String,
}

fn default_cu_url() -> String {
    "https://cu.ao-testnet.xyz".to_string()
}

fn default_gateway_url() -> String {
    "https://compute.hyperbeam.xyz".to_string()
}

fn default_cu_url_a() -> String {
    "https://cu.ardrive.io".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            cu_url: default_cu_url(),
            gateway_url: default_gateway_url(),
            cu_url_a: default_cu_url_a(),
            cu_url_b: default_cu_url(),
        }
    }
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            concurrency: 15,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            timeout_ms: 30_000,
            max_addresses: None,
            fallback: FallbackPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            recon: ReconConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from defaults, an optional `tally.toml` (or the
    /// file named by `TALLY_CONFIG`), and `TALLY__SECTION__KEY` env vars.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("TALLY_CONFIG").unwrap_or_else(|_| "tally.toml".to_string());
        Self::load_from(&path)
    }

    /// Same as [`load`](Self::load) with an explicit file path.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        let app: AppConfig = cfg.try_deserialize()?;
        app.validate().map_err(config::ConfigError::Message)?;
        Ok(app)
    }

    /// Checks value ranges and endpoint shapes.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("sources.cu_url", &self.sources.cu_url),
            ("sources.gateway_url", &self.sources.gateway_url),
            ("sources.cu_url_a", &self.sources.cu_url_a),
            ("sources.cu_url_b", &self.sources.cu_url_b),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{name} must be an http(s) URL, got {url:?}"));
            }
        }
        if !(1..=100).contains(&self.recon.concurrency) {
            return Err(format!(
                "recon.concurrency must be between 1 and 100, got {}",
                self.recon.concurrency
            ));
        }
        if self.recon.retry_attempts > 10 {
            return Err(format!(
                "recon.retry_attempts must be at most 10, got {}",
                self.recon.retry_attempts
            ));
        }
        if self.recon.timeout_ms < 1000 {
            return Err(format!(
                "recon.timeout_ms must be at least 1000, got {}",
                self.recon.timeout_ms
            ));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            ));
        }
        Ok(())
    }

    /// Retry policy derived from the recon section.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.recon.retry_attempts,
            Duration::from_millis(self.recon.retry_delay_ms),
        )
    }

    /// Per-request timeout derived from the recon section.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.recon.timeout_ms)
    }
}
