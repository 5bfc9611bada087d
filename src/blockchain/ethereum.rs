use alloy_primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blockchain::adapter::{rpc_call, truncate_address, AdapterError, ChainAdapter};
use crate::blockchain::price::{PriceResolver, TokenRef};
use crate::config::Config;
use crate::dispatch::{fanout, Dispatcher, RequestSpec};
use crate::models::{Chain, TokenBalance, Transaction, TxStatus, TxType};
use crate::units::{self, format_units, format_wei, parse_decimal_quantity, parse_hex_quantity};

const DEFAULT_TOKEN_DECIMALS: u8 = 18;
const DEFAULT_TOKEN_SYMBOL: &str = "ERC20";
const NO_TRANSACTIONS: &str = "No transactions found";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResult {
    #[serde(default)]
    token_balances: Vec<TokenBalanceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalanceEntry {
    contract_address: String,
    token_balance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenMetadata {
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<u8>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerTx {
    hash: String,
    time_stamp: String,
    from: String,
    /// `null` for contract creations on some explorers
    #[serde(default)]
    to: Option<String>,
    value: String,
    gas_price: String,
    gas_used: String,
    #[serde(default)]
    is_error: Option<String>,
}

/// Ethereum via an Alchemy-dialect JSON-RPC endpoint plus an Etherscan-style explorer
pub struct EthereumAdapter {
    rpc: Dispatcher,
    explorer: Dispatcher,
    prices: Arc<PriceResolver>,
    rpc_url: String,
    explorer_url: String,
    explorer_api_key: Option<String>,
    tx_limit: usize,
    concurrency: usize,
}

impl EthereumAdapter {
    pub fn new(config: &Config, rpc: Dispatcher, explorer: Dispatcher, prices: Arc<PriceResolver>) -> Self {
        Self {
            rpc,
            explorer,
            prices,
            rpc_url: config.ethereum_rpc_url.clone(),
            explorer_url: config.etherscan_api_url.clone(),
            explorer_api_key: config.etherscan_api_key.clone(),
            tx_limit: config.tx_list_limit,
            concurrency: config.fanout_concurrency,
        }
    }

    /// Metadata, price and logo for one held contract. Never fails.
    async fn build_token(&self, contract: String, raw: U256) -> TokenBalance {
        let metadata = match rpc_call::<TokenMetadata>(
            &self.rpc,
            &self.rpc_url,
            "alchemy_getTokenMetadata",
            json!([contract]),
        )
        .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Token metadata lookup failed for {}: {}", contract, e);
                TokenMetadata::default()
            }
        };

        let lookup_name = metadata.name.clone().unwrap_or_default();
        let decimals = metadata.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS);
        let balance = format_units(raw, decimals);

        let price = self
            .prices
            .resolve(
                Chain::Ethereum,
                TokenRef { address: &contract, name: &lookup_name },
                metadata.logo.clone(),
            )
            .await;

        TokenBalance {
            name: metadata
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| truncate_address(&contract)),
            symbol: metadata
                .symbol
                .filter(|symbol| !symbol.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
            decimals,
            balance_usd: units::usd_value(&balance, price.price_usd.unwrap_or(0.0)),
            price_resolved: price.price_usd.is_some(),
            logo_url: price.logo_url,
            balance,
            token_address: contract,
        }
    }

    fn explorer_request(&self, address: &str) -> RequestSpec {
        let spec = RequestSpec::get(&self.explorer_url)
            .query("module", "account")
            .query("action", "txlist")
            .query("address", address)
            .query("startblock", 0)
            .query("endblock", 99_999_999)
            .query("page", 1)
            .query("offset", self.tx_limit)
            .query("sort", "desc");

        match &self.explorer_api_key {
            Some(key) => spec.query("apikey", key),
            None => spec,
        }
    }
}

#[async_trait]
impl ChainAdapter for EthereumAdapter {
    async fn get_native_balance(&self, address: &str) -> Result<String, AdapterError> {
        let wei: String = rpc_call(&self.rpc, &self.rpc_url, "eth_getBalance", json!([address, "latest"])).await?;
        Ok(format_wei(parse_hex_quantity(&wei)?))
    }

    async fn get_token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, AdapterError> {
        let listing: TokenBalancesResult = rpc_call(
            &self.rpc,
            &self.rpc_url,
            "alchemy_getTokenBalances",
            json!([address, "erc20"]),
        )
        .await?;

        let held: Vec<(String, U256)> = listing
            .token_balances
            .into_iter()
            .filter_map(|entry| {
                let raw = entry.token_balance?;
                match parse_hex_quantity(&raw) {
                    Ok(amount) if !amount.is_zero() => Some((entry.contract_address, amount)),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Skipping token {}: {}", entry.contract_address, e);
                        None
                    }
                }
            })
            .collect();

        info!("Found {} non-zero token balances for {}", held.len(), address);

        let tokens = fanout::bounded(held, self.concurrency, |(contract, raw)| {
            self.build_token(contract, raw)
        })
        .await;

        Ok(tokens)
    }

    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, AdapterError> {
        let response: ExplorerResponse = self.explorer.send_json(&self.explorer_request(address)).await?;

        if response.status != "1" {
            if response.message.starts_with(NO_TRANSACTIONS) {
                debug!("No transactions for {}", address);
                return Ok(Vec::new());
            }
            let detail = response.result.as_str().unwrap_or_default();
            return Err(AdapterError::Explorer(format!("{} {}", response.message, detail).trim().to_string()));
        }

        let rows: Vec<ExplorerTx> = serde_json::from_value(response.result)
            .map_err(|e| AdapterError::Decode(format!("txlist: {}", e)))?;

        rows.into_iter()
            .take(self.tx_limit)
            .map(|row| convert_explorer_tx(address, row))
            .collect()
    }
}

fn convert_explorer_tx(address: &str, row: ExplorerTx) -> Result<Transaction, AdapterError> {
    let value = parse_decimal_quantity(&row.value)?;
    let gas_used = parse_decimal_quantity(&row.gas_used)?;
    let gas_price = parse_decimal_quantity(&row.gas_price)?;
    let seconds: i64 = row
        .time_stamp
        .parse()
        .map_err(|_| AdapterError::Decode(format!("timeStamp {:?} for {}", row.time_stamp, row.hash)))?;

    let timestamp_millis = seconds
        .checked_mul(1000)
        .ok_or_else(|| AdapterError::Decode(format!("timeStamp {:?} out of range for {}", row.time_stamp, row.hash)))?;
    let to = row.to.unwrap_or_default();

    let kind = if row.from.eq_ignore_ascii_case(address) {
        TxType::Send
    } else if to.eq_ignore_ascii_case(address) {
        TxType::Receive
    } else {
        TxType::Other
    };

    let status = match row.is_error.as_deref() {
        Some("1") => TxStatus::Failed,
        _ => TxStatus::Success,
    };

    Ok(Transaction {
        hash: row.hash,
        timestamp_millis,
        from: row.from,
        to,
        value: format_wei(value),
        fee: format_wei(gas_used.saturating_mul(gas_price)),
        status,
        kind,
    })
}
