use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::blockchain::{AdapterError, ChainAdapter, EthereumAdapter, PriceResolver, SolanaAdapter};
use crate::config::Config;
use crate::dispatch::{Dispatcher, HostLimiters};
use crate::models::{Chain, WalletSnapshot};
use crate::units;
use crate::validation::{require_chain, ValidationError};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error(transparent)]
    InvalidAddress(#[from] ValidationError),

    #[error("Failed to fetch {chain} wallet data: {source}")]
    WalletFetchFailed {
        chain: Chain,
        #[source]
        source: AdapterError,
    },
}

impl WalletError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, WalletError::WalletFetchFailed { source, .. } if source.is_rate_limited())
    }
}

/// Classifies an address, picks the chain adapter, and assembles the snapshot
pub struct WalletAggregator {
    ethereum: Arc<dyn ChainAdapter>,
    solana: Arc<dyn ChainAdapter>,
    prices: Arc<PriceResolver>,
}

impl WalletAggregator {
    pub fn new(ethereum: Arc<dyn ChainAdapter>, solana: Arc<dyn ChainAdapter>, prices: Arc<PriceResolver>) -> Self {
        Self {
            ethereum,
            solana,
            prices,
        }
    }

    /// Wire every upstream host to its own limiter and build both adapters
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.rpc_timeout()).build()?;
        let retry = config.retry_policy();
        let mut limiters = HostLimiters::new(config.min_request_spacing);
        let mut dispatcher =
            |url: &str| Dispatcher::new(http.clone(), limiters.for_url(url), retry.clone());

        let prices = Arc::new(PriceResolver::new(config, dispatcher(&config.coingecko_api_url)));
        let ethereum = EthereumAdapter::new(
            config,
            dispatcher(&config.ethereum_rpc_url),
            dispatcher(&config.etherscan_api_url),
            prices.clone(),
        );
        let solana = SolanaAdapter::new(
            config,
            dispatcher(&config.solana_rpc_url),
            dispatcher(&config.solana_token_list_url),
            prices.clone(),
        );

        Ok(Self::new(Arc::new(ethereum), Arc::new(solana), prices))
    }

    fn adapter(&self, chain: Chain) -> &dyn ChainAdapter {
        match chain {
            Chain::Ethereum => self.ethereum.as_ref(),
            Chain::Solana => self.solana.as_ref(),
        }
    }

    /// Fetch a full wallet snapshot.
    ///
    /// Unrecognized addresses fail before any network call. A failure of any
    /// top-level balance, token or transaction call aborts the whole request;
    /// enrichment failures only leave fields unresolved.
    pub async fn get_wallet_data(&self, address: &str) -> Result<WalletSnapshot, WalletError> {
        let chain = require_chain(address)?;
        let adapter = self.adapter(chain);
        info!("Fetching {} wallet data for {}", chain, address);

        // Price lookup never fails the join; a top-level failure drops it mid-flight
        let native_price = async {
            let price = match self.prices.native_price(chain).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("{} price lookup failed: {}", chain.native_symbol(), e);
                    None
                }
            };
            Ok::<_, AdapterError>(price)
        };

        let (native_balance, tokens, transactions, native_price) = tokio::try_join!(
            adapter.get_native_balance(address),
            adapter.get_token_balances(address),
            adapter.get_transactions(address),
            native_price,
        )
        .map_err(|source| {
            error!("Wallet fetch for {} failed: {}", address, source);
            WalletError::WalletFetchFailed { chain, source }
        })?;

        info!(
            "Fetched {} wallet {}: {} {}, {} tokens, {} transactions",
            chain,
            address,
            native_balance,
            chain.native_symbol(),
            tokens.len(),
            transactions.len()
        );

        Ok(WalletSnapshot {
            address: address.to_string(),
            chain,
            native_balance_usd: units::usd_value(&native_balance, native_price.unwrap_or(0.0)),
            native_price_resolved: native_price.is_some(),
            native_balance,
            tokens,
            transactions,
        })
    }
}
