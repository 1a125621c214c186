//! Compute-unit client: dry-run balance queries and evaluated message
//! results.

use crate::config::AppConfig;
use crate::recon::retry::RetryPolicy;
use crate::source::errors::SourceError;
use crate::source::parse_balance_map;
use crate::types::BalanceMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Required length of process and message identifiers.
const ID_LEN: usize = 43;

#[derive(Debug, Deserialize)]
struct CuResponse {
    #[serde(rename = "Messages", default)]
    messages: Vec<CuMessage>,
}

#[derive(Debug, Deserialize)]
struct CuMessage {
    #[serde(rename = "Data", default)]
    data: String,
}

/// Client for a compute-unit endpoint.
///
/// Dry-run queries evaluate a `Balances` message against current process
/// state; result queries fetch the output of an already evaluated
/// message by id.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    client: Client,
    cu_url: String,
    retry: RetryPolicy,
}

/// Checks that `id` is a 43-character base64url identifier.
fn validate_id(id: &str) -> bool {
    id.len() == ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Validates a process identifier, returning it on success.
pub fn validate_process_id(id: &str) -> Result<&str, SourceError> {
    if validate_id(id) {
        Ok(id)
    } else {
        Err(SourceError::InvalidProcessId(id.to_string()))
    }
}

/// Validates a message identifier, returning it on success.
pub fn validate_message_id(id: &str) -> Result<&str, SourceError> {
    if validate_id(id) {
        Ok(id)
    } else {
        Err(SourceError::InvalidMessageId(id.to_string()))
    }
}

impl ComputeClient {
    pub fn new(config: &AppConfig, cu_url: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .use_rustls_tls()
            .build()
            .map_err(SourceError::Network)?;

        Ok(Self {
            client,
            cu_url: cu_url.trim_end_matches('/').to_string(),
            retry: config.retry_policy(),
        })
    }

    /// Evaluates a `Balances` dry-run against the process and returns the
    /// full balance map.
    ///
    /// Not retried: this is the baseline acquisition step, and its
    /// failure is fatal to the run rather than absorbable.
    pub async fn dry_run_balances(&self, process_id: &str) -> Result<BalanceMap, SourceError> {
        validate_process_id(process_id)?;
        let url = format!("{}/dry-run?process-id={}", self.cu_url, process_id);
        let message = json!({
            "Id": "1234",
            "Target": process_id,
            "Owner": "1234",
            "Anchor": "0",
            "Data": "1234",
            "Tags": [
                { "name": "Action", "value": "Balances" },
                { "name": "Data-Protocol", "value": "ao" },
                { "name": "Type", "value": "Message" },
                { "name": "Variant", "value": "ao.TN.1" }
            ]
        });

        let response = self
            .client
            .post(&url)
            .json(&message)
            .send()
            .await
            .map_err(SourceError::from_network)?;
        let balances = Self::decode_balances(response).await?;
        if balances.is_empty() {
            return Err(SourceError::EmptyBaseline);
        }
        Ok(balances)
    }

    /// Fetches the balance map from an already evaluated message,
    /// retrying transient failures.
    pub async fn result_balances(
        &self,
        message_id: &str,
        process_id: &str,
    ) -> Result<BalanceMap, SourceError> {
        validate_message_id(message_id)?;
        validate_process_id(process_id)?;
        let url = format!(
            "{}/result/{}?process-id={}",
            self.cu_url, message_id, process_id
        );

        self.retry
            .execute(|| async {
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(SourceError::from_network)?;
                Self::decode_balances(response).await
            })
            .await
    }

    async fn decode_balances(response: reqwest::Response) -> Result<BalanceMap, SourceError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(256);
            return Err(SourceError::HttpStatus(status.as_u16(), body));
        }

        let decoded: CuResponse = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(format!("malformed CU response: {e}")))?;

        let first = decoded.messages.first().ok_or_else(|| {
            SourceError::InvalidResponse("CU response contains no messages".to_string())
        })?;

        let data: serde_json::Value = serde_json::from_str(&first.data).map_err(|e| {
            SourceError::InvalidResponse(format!("message data is not JSON: {e}"))
        })?;

        parse_balance_map(&data)
    }
}
