//! USD price and logo lookups against a CoinGecko-style market-data API.
//!
//! Per-token resolution never fails: any lookup error is logged and the field
//! is left unresolved.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::Config;
use crate::dispatch::{DispatchError, Dispatcher, RequestSpec};
use crate::models::Chain;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Token identity used for lookups
#[derive(Debug, Clone, Copy)]
pub struct TokenRef<'a> {
    /// Contract address or mint
    pub address: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceInfo {
    pub price_usd: Option<f64>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CoinDetail {
    image: Option<CoinImage>,
}

#[derive(Debug, Deserialize)]
struct CoinImage {
    small: Option<String>,
    thumb: Option<String>,
}

pub struct PriceResolver {
    dispatcher: Dispatcher,
    base_url: String,
    api_key: Option<String>,
}

impl PriceResolver {
    pub fn new(config: &Config, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            base_url: config.coingecko_api_url.trim_end_matches('/').to_string(),
            api_key: config.coingecko_api_key.clone(),
        }
    }

    /// USD price of the chain's native asset
    pub async fn native_price(&self, chain: Chain) -> Result<Option<f64>, DispatchError> {
        self.price_by_id(chain.market_id()).await
    }

    /// Best-effort price and logo for one token.
    ///
    /// Price: contract-address lookup first, then the normalized name as a coin
    /// id. Logo: `known_logo` if the caller already has one, else the coin page.
    pub async fn resolve(&self, chain: Chain, token: TokenRef<'_>, known_logo: Option<String>) -> PriceInfo {
        let coin_id = normalize_key(token.name);

        let by_contract = match self.price_by_contract(chain, token.address).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Contract price lookup failed for {} on {}: {}", token.address, chain, e);
                None
            }
        };

        let price_usd = match by_contract {
            Some(price) => Some(price),
            None if !coin_id.is_empty() => match self.price_by_id(&coin_id).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Price lookup failed for {} ({}): {}", token.address, coin_id, e);
                    None
                }
            },
            None => None,
        };

        let logo_url = match known_logo.filter(|logo| !logo.is_empty()) {
            Some(logo) => Some(logo),
            None if !coin_id.is_empty() => match self.logo_by_id(&coin_id).await {
                Ok(logo) => logo,
                Err(e) => {
                    warn!("Logo lookup failed for {} ({}): {}", token.address, coin_id, e);
                    None
                }
            },
            None => None,
        };

        if price_usd.is_none() {
            debug!("No USD price for {} on {}", token.address, chain);
        }

        PriceInfo { price_usd, logo_url }
    }

    async fn price_by_contract(&self, chain: Chain, address: &str) -> Result<Option<f64>, DispatchError> {
        let spec = self
            .request(&format!("simple/token_price/{}", chain.market_id()))
            .query("contract_addresses", address)
            .query("vs_currencies", "usd");
        let quotes: HashMap<String, UsdQuote> = self.dispatcher.send_json(&spec).await?;

        // Ethereum contracts come back lowercased, Solana mints unchanged
        Ok(quotes
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(address))
            .and_then(|(_, quote)| quote.usd))
    }

    async fn price_by_id(&self, id: &str) -> Result<Option<f64>, DispatchError> {
        let spec = self
            .request("simple/price")
            .query("ids", id)
            .query("vs_currencies", "usd");
        let mut quotes: HashMap<String, UsdQuote> = self.dispatcher.send_json(&spec).await?;

        Ok(quotes.remove(id).and_then(|quote| quote.usd))
    }

    async fn logo_by_id(&self, id: &str) -> Result<Option<String>, DispatchError> {
        let spec = self
            .request(&format!("coins/{}", id))
            .query("localization", "false")
            .query("tickers", "false")
            .query("market_data", "false")
            .query("community_data", "false")
            .query("developer_data", "false");
        let detail: CoinDetail = self.dispatcher.send_json(&spec).await?;

        Ok(detail.image.and_then(|image| image.small.or(image.thumb)))
    }

    fn request(&self, path: &str) -> RequestSpec {
        let spec = RequestSpec::get(format!("{}/{}", self.base_url, path));
        match &self.api_key {
            Some(key) => spec.header(API_KEY_HEADER, key),
            None => spec,
        }
    }
}

/// Lookup key derived from a display name: lowercase, runs of anything that is
/// not alphanumeric collapsed to `-`
pub fn normalize_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !key.is_empty() {
                key.push('-');
            }
            pending_dash = false;
            key.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    key
}
