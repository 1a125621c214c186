//! HTTP state-compute gateway client serving per-address balances.

use crate::config::AppConfig;
use crate::recon::retry::RetryPolicy;
use crate::source::errors::SourceError;
use reqwest::{Client, StatusCode};

/// Longest error-body excerpt carried into an error message.
const BODY_EXCERPT_LEN: usize = 256;

/// Client for the per-address balance endpoint
/// `GET {base}/{process_id}~process@1.0/compute/balances/{address}`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    process_id: String,
    retry: RetryPolicy,
}

impl GatewayClient {
    pub fn new(config: &AppConfig, process_id: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .use_rustls_tls()
            .build()
            .map_err(SourceError::Network)?;

        Ok(Self {
            client,
            base_url: config.sources.gateway_url.trim_end_matches('/').to_string(),
            process_id: process_id.to_string(),
            retry: config.retry_policy(),
        })
    }

    /// Fetches the balance of one address, retrying transient failures.
    ///
    /// A 404 means the gateway has no state for the address and is a
    /// definitive zero, returned without retrying.
    pub async fn balance(&self, address: &str) -> Result<String, SourceError> {
        self.retry.execute(|| self.fetch_once(address)).await
    }

    async fn fetch_once(&self, address: &str) -> Result<String, SourceError> {
        let url = format!(
            "{}/{}~process@1.0/compute/balances/{}",
            self.base_url, self.process_id, address
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(SourceError::from_network)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok("0".to_string());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(BODY_EXCERPT_LEN);
            return Err(SourceError::HttpStatus(status.as_u16(), body));
        }

        let body = response.text().await.map_err(SourceError::from_network)?;
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(SourceError::InvalidResponse(
                "gateway returned an empty body".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}
