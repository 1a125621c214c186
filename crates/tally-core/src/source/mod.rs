//! Balance sources: the compute-unit query interface, the HTTP state
//! gateway, and file-backed baselines.

pub mod baseline;
pub mod compute;
pub mod errors;
pub mod gateway;

pub use baseline::{load_baseline, BaselineSource};
pub use compute::ComputeClient;
pub use errors::SourceError;
pub use gateway::GatewayClient;

use crate::types::BalanceMap;

/// Converts a decoded JSON object into a [`BalanceMap`].
///
/// Values are kept textual: strings pass through, numbers are rendered
/// with their JSON representation, anything else falls back to its JSON
/// text and is normalized later at comparison time.
pub fn parse_balance_map(value: &serde_json::Value) -> Result<BalanceMap, SourceError> {
    let object = value.as_object().ok_or_else(|| {
        SourceError::InvalidResponse("balance payload is not a JSON object".to_string())
    })?;

    let mut balances = BalanceMap::with_capacity(object.len());
    for (address, balance) in object {
        let text = match balance {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        balances.insert(address.clone(), text);
    }
    Ok(balances)
}
