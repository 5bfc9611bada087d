use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::{DispatchError, Dispatcher, RequestSpec};
use crate::models::{TokenBalance, Transaction};
use crate::units::UnitsError;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Explorer error: {0}")]
    Explorer(String),

    #[error("Malformed upstream response: {0}")]
    Decode(String),

    #[error(transparent)]
    InvalidQuantity(#[from] UnitsError),
}

impl AdapterError {
    /// Upstream kept answering 429 after the retry budget was spent
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AdapterError::Dispatch(DispatchError::RateLimited { .. }))
    }
}

/// Everything the aggregator needs from one chain
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Native balance as a decimal string in whole units (ETH, SOL)
    async fn get_native_balance(&self, address: &str) -> Result<String, AdapterError>;

    /// Token holdings, each enriched with price and logo where available
    async fn get_token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, AdapterError>;

    /// Recent transactions, most recent first
    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, AdapterError>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Issue a JSON-RPC call and decode its `result`.
///
/// A `null` result decodes into `T` as-is, so callers that expect one ask for
/// `Option<_>`.
pub(crate) async fn rpc_call<T: DeserializeOwned>(
    dispatcher: &Dispatcher,
    url: &str,
    method: &str,
    params: Value,
) -> Result<T, AdapterError> {
    let spec = RequestSpec::json_rpc(url, method, params);
    let envelope: RpcEnvelope = dispatcher.send_json(&spec).await?;

    if let Some(error) = envelope.error {
        return Err(AdapterError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = envelope.result.unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|e| AdapterError::Decode(format!("{}: {}", method, e)))
}

/// `abcd...wxyz` for display when no name is known
pub(crate) fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
