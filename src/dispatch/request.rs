use reqwest::{Method, Url};
use serde_json::{json, Value};

/// Description of one outbound call, independent of the HTTP client
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get(url)
        }
    }

    /// JSON-RPC 2.0 call with a fixed request id
    pub fn json_rpc(url: impl Into<String>, method: &str, params: Value) -> Self {
        Self::post_json(
            url,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            }),
        )
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Short label for logs: scheme, host and port only. Paths and queries may
    /// carry API keys.
    pub fn describe(&self) -> String {
        let origin = Url::parse(&self.url)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| "<invalid url>".to_string());

        let rpc_method = self
            .body
            .as_ref()
            .and_then(|body| body.get("method"))
            .and_then(|method| method.as_str());

        match rpc_method {
            Some(rpc_method) => format!("{} {} ({})", self.method, origin, rpc_method),
            None => format!("{} {}", self.method, origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_envelope() {
        let spec = RequestSpec::json_rpc("http://rpc", "getBalance", json!(["addr"]));
        assert_eq!(spec.method, Method::POST);

        let body = spec.body.clone().unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "getBalance");
        assert_eq!(body["params"][0], "addr");
        assert_eq!(spec.describe(), "POST http://rpc (getBalance)");
    }

    #[test]
    fn test_describe_hides_query() {
        let spec = RequestSpec::get("http://explorer/api").query("apikey", "secret");
        assert_eq!(spec.query.len(), 1);
        assert_eq!(spec.describe(), "GET http://explorer");
    }

    #[test]
    fn test_describe_hides_key_in_path() {
        let spec = RequestSpec::json_rpc(
            "https://eth-mainnet.g.alchemy.com/v2/SECRETKEY",
            "eth_getBalance",
            json!([]),
        );
        assert_eq!(spec.describe(), "POST https://eth-mainnet.g.alchemy.com (eth_getBalance)");

        let spec = RequestSpec::get("http://127.0.0.1:4000/v2/SECRETKEY");
        assert_eq!(spec.describe(), "GET http://127.0.0.1:4000");
    }
}
