#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use wallet_data_service::config::Config;
use wiremock::{MockServer, ResponseTemplate};

pub const ETH_WALLET: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
pub const SOL_WALLET: &str = "9ii1FEiWSgDzXAbwj2oTmJXzkfCw78mnHwPQv9WQ5iTn";
pub const SOL_DEST: &str = "AhAkbf3cGD6HkFod2rBEE8mie8ks9p7vuss6WGkUFAM9";

/// One mock server per upstream host
pub struct Upstreams {
    pub ethereum_rpc: MockServer,
    pub explorer: MockServer,
    pub solana_rpc: MockServer,
    pub token_list: MockServer,
    pub prices: MockServer,
}

impl Upstreams {
    pub async fn start() -> Self {
        Self {
            ethereum_rpc: MockServer::start().await,
            explorer: MockServer::start().await,
            solana_rpc: MockServer::start().await,
            token_list: MockServer::start().await,
            prices: MockServer::start().await,
        }
    }

    /// Config pointing at the mocks, with pacing and backoff shrunk for speed
    pub fn config(&self) -> Config {
        Config {
            ethereum_rpc_url: self.ethereum_rpc.uri(),
            etherscan_api_url: format!("{}/api", self.explorer.uri()),
            solana_rpc_url: self.solana_rpc.uri(),
            solana_token_list_url: format!("{}/strict", self.token_list.uri()),
            coingecko_api_url: self.prices.uri(),
            min_request_spacing: Duration::ZERO,
            retry_base_delay: Duration::from_millis(10),
            tx_list_limit: 10,
            tx_detail_limit: 2,
            ..Config::default()
        }
    }

    pub async fn total_requests(&self) -> usize {
        request_count(&self.ethereum_rpc).await
            + request_count(&self.explorer).await
            + request_count(&self.solana_rpc).await
            + request_count(&self.token_list).await
            + request_count(&self.prices).await
    }
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}
