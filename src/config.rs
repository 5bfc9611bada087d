// Configuration for:
// - Server listening address/port
// - Upstream endpoints (Ethereum RPC, block explorer, Solana RPC, token list, market data)
// - Dispatch pacing and retry budget
// - Transaction list / detail caps and fan-out width

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub ethereum_rpc_url: String,
    pub etherscan_api_url: String,
    pub etherscan_api_key: Option<String>,
    pub solana_rpc_url: String,
    pub solana_token_list_url: String,
    pub coingecko_api_url: String,
    pub coingecko_api_key: Option<String>,
    pub min_request_spacing: Duration,
    pub max_retries: usize,
    pub retry_base_delay: Duration,
    pub rpc_timeout_secs: u64,
    pub tx_list_limit: usize,
    pub tx_detail_limit: usize,
    pub fanout_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            ethereum_rpc_url: "https://eth-mainnet.g.alchemy.com/v2/demo".to_string(),
            etherscan_api_url: "https://api.etherscan.io/api".to_string(),
            etherscan_api_key: None,
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            solana_token_list_url: "https://token.jup.ag/strict".to_string(),
            coingecko_api_url: "https://api.coingecko.com/api/v3".to_string(),
            coingecko_api_key: None,
            min_request_spacing: Duration::from_millis(500),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            rpc_timeout_secs: 30,
            tx_list_limit: 10,
            tx_detail_limit: 5,
            fanout_concurrency: 8,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            ethereum_rpc_url: env::var("ETHEREUM_RPC_URL").unwrap_or(defaults.ethereum_rpc_url),
            etherscan_api_url: env::var("ETHERSCAN_API_URL").unwrap_or(defaults.etherscan_api_url),
            etherscan_api_key: optional_var("ETHERSCAN_API_KEY"),
            solana_rpc_url: env::var("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url),
            solana_token_list_url: env::var("SOLANA_TOKEN_LIST_URL")
                .unwrap_or(defaults.solana_token_list_url),
            coingecko_api_url: env::var("COINGECKO_API_URL").unwrap_or(defaults.coingecko_api_url),
            coingecko_api_key: optional_var("COINGECKO_API_KEY"),
            min_request_spacing: Duration::from_millis(parse_var("MIN_REQUEST_SPACING_MS", 500)),
            max_retries: parse_var("MAX_RETRIES", defaults.max_retries),
            retry_base_delay: Duration::from_millis(parse_var("RETRY_BASE_DELAY_MS", 1000)),
            rpc_timeout_secs: parse_var("RPC_TIMEOUT_SECS", defaults.rpc_timeout_secs),
            tx_list_limit: parse_var("TX_LIST_LIMIT", defaults.tx_list_limit),
            tx_detail_limit: parse_var("TX_DETAIL_LIMIT", defaults.tx_detail_limit),
            fanout_concurrency: parse_var("FANOUT_CONCURRENCY", defaults.fanout_concurrency),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
