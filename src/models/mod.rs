// Unified wallet model shared by every chain adapter.
// JSON field names are camelCase for the HTTP collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Solana,
}

impl Chain {
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ETH",
            Chain::Solana => "SOL",
        }
    }

    /// Market-data id of the native asset; also its platform id for contract lookups
    pub fn market_id(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.market_id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub token_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Already divided by `10^decimals`
    pub balance: String,
    pub balance_usd: f64,
    /// False when no price could be found; `balance_usd` is then 0
    pub price_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Send,
    Receive,
    Swap,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub timestamp_millis: i64,
    pub from: String,
    /// Empty when the recipient could not be determined
    pub to: String,
    pub value: String,
    pub fee: String,
    pub status: TxStatus,
    #[serde(rename = "type")]
    pub kind: TxType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub address: String,
    pub chain: Chain,
    pub native_balance: String,
    pub native_balance_usd: f64,
    pub native_price_resolved: bool,
    pub tokens: Vec<TokenBalance>,
    pub transactions: Vec<Transaction>,
}

/// Result of a format-only address check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressValidation {
    pub is_valid: bool,
    pub chain: Option<Chain>,
}
