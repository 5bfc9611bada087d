use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::json;
use solana_client::rpc_response::{Response, RpcConfirmedTransactionStatusWithSignature};
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;
use spl_token::ID as TOKEN_PROGRAM_ID;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blockchain::adapter::{rpc_call, truncate_address, AdapterError, ChainAdapter};
use crate::blockchain::models::{extract_transaction, TokenAccount, TokenListEntry};
use crate::blockchain::price::{PriceResolver, TokenRef};
use crate::config::Config;
use crate::dispatch::{fanout, Dispatcher, RequestSpec};
use crate::models::{Chain, TokenBalance, Transaction};
use crate::units::{self, format_lamports, format_units, parse_decimal_quantity};

const FALLBACK_SYMBOL: &str = "SPL";

/// A held SPL token before enrichment
struct HeldToken {
    mint: String,
    raw: U256,
    decimals: u8,
}

/// Solana via JSON-RPC, with names from a remote token list
pub struct SolanaAdapter {
    rpc: Dispatcher,
    token_list: Dispatcher,
    prices: Arc<PriceResolver>,
    rpc_url: String,
    token_list_url: String,
    tx_limit: usize,
    detail_limit: usize,
    concurrency: usize,
}

impl SolanaAdapter {
    pub fn new(config: &Config, rpc: Dispatcher, token_list: Dispatcher, prices: Arc<PriceResolver>) -> Self {
        info!(
            "Initializing Solana adapter: {} signatures, {} expanded",
            config.tx_list_limit,
            config.tx_detail_limit.min(config.tx_list_limit)
        );

        Self {
            rpc,
            token_list,
            prices,
            rpc_url: config.solana_rpc_url.clone(),
            token_list_url: config.solana_token_list_url.clone(),
            tx_limit: config.tx_list_limit,
            detail_limit: config.tx_detail_limit.min(config.tx_list_limit),
            concurrency: config.fanout_concurrency,
        }
    }

    /// Token list keyed by mint. Fetched on every call; an unavailable list
    /// leaves every token on its fallback name.
    async fn fetch_token_list(&self) -> HashMap<String, TokenListEntry> {
        let spec = RequestSpec::get(&self.token_list_url);
        match self.token_list.send_json::<Vec<TokenListEntry>>(&spec).await {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| (entry.address.clone(), entry))
                .collect(),
            Err(e) => {
                warn!("Token list unavailable, using fallback names: {}", e);
                HashMap::new()
            }
        }
    }

    async fn build_token(&self, held: HeldToken, listed: Option<&TokenListEntry>) -> TokenBalance {
        let balance = format_units(held.raw, held.decimals);
        let lookup_name = listed.map(|entry| entry.name.as_str()).unwrap_or_default();

        let price = self
            .prices
            .resolve(
                Chain::Solana,
                TokenRef { address: &held.mint, name: lookup_name },
                listed.and_then(|entry| entry.logo_uri.clone()),
            )
            .await;

        let (name, symbol) = match listed {
            Some(entry) => (entry.name.clone(), entry.symbol.clone()),
            None => (truncate_address(&held.mint), FALLBACK_SYMBOL.to_string()),
        };

        TokenBalance {
            name,
            symbol,
            decimals: held.decimals,
            balance_usd: units::usd_value(&balance, price.price_usd.unwrap_or(0.0)),
            price_resolved: price.price_usd.is_some(),
            logo_url: price.logo_url,
            balance,
            token_address: held.mint,
        }
    }

    /// Full transaction for one signature; failures are logged and skipped
    async fn fetch_transaction(
        &self,
        address: &str,
        signature: &RpcConfirmedTransactionStatusWithSignature,
    ) -> Option<Transaction> {
        let detail = rpc_call::<Option<EncodedConfirmedTransactionWithStatusMeta>>(
            &self.rpc,
            &self.rpc_url,
            "getTransaction",
            json!([
                signature.signature,
                {"encoding": "jsonParsed", "maxSupportedTransactionVersion": 0}
            ]),
        )
        .await;

        match detail {
            Ok(Some(tx)) => extract_transaction(address, signature, &tx),
            Ok(None) => {
                warn!("Transaction {} not found", signature.signature);
                None
            }
            Err(e) => {
                warn!("Failed to get transaction {}: {}", signature.signature, e);
                None
            }
        }
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    async fn get_native_balance(&self, address: &str) -> Result<String, AdapterError> {
        let balance: Response<u64> = rpc_call(&self.rpc, &self.rpc_url, "getBalance", json!([address])).await?;
        Ok(format_lamports(balance.value))
    }

    async fn get_token_balances(&self, address: &str) -> Result<Vec<TokenBalance>, AdapterError> {
        let accounts: Response<Vec<TokenAccount>> = rpc_call(
            &self.rpc,
            &self.rpc_url,
            "getTokenAccountsByOwner",
            json!([
                address,
                {"programId": TOKEN_PROGRAM_ID.to_string()},
                {"encoding": "jsonParsed"}
            ]),
        )
        .await?;

        let mut held = Vec::new();
        for account in accounts.value {
            let info = account.account.data.parsed.info;
            let raw = match parse_decimal_quantity(&info.token_amount.amount) {
                Ok(raw) if !raw.is_zero() => raw,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Skipping token account for mint {}: {}", info.mint, e);
                    continue;
                }
            };
            held.push(HeldToken {
                mint: info.mint,
                raw,
                decimals: info.token_amount.decimals,
            });
        }

        info!("Found {} non-zero token accounts for {}", held.len(), address);
        if held.is_empty() {
            return Ok(Vec::new());
        }

        let token_list = self.fetch_token_list().await;
        let tokens = fanout::bounded(held, self.concurrency, |token| {
            let listed = token_list.get(&token.mint);
            self.build_token(token, listed)
        })
        .await;

        Ok(tokens)
    }

    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, AdapterError> {
        let signatures: Vec<RpcConfirmedTransactionStatusWithSignature> = rpc_call(
            &self.rpc,
            &self.rpc_url,
            "getSignaturesForAddress",
            json!([address, {"limit": self.tx_limit}]),
        )
        .await?;

        debug!(
            "Expanding {} of {} signatures for {}",
            signatures.len().min(self.detail_limit),
            signatures.len(),
            address
        );

        let expanded = fanout::bounded(
            signatures.into_iter().take(self.detail_limit),
            self.concurrency,
            |signature| async move { self.fetch_transaction(address, &signature).await },
        )
        .await;

        Ok(expanded.into_iter().flatten().collect())
    }
}
