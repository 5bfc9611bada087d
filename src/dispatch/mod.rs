//! Outbound call dispatch: per-host spacing plus retry with exponential backoff.

pub mod fanout;
pub mod limiter;
pub mod request;

pub use limiter::{HostLimiters, RateLimiter};
pub use request::RequestSpec;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Rate limited by upstream: {body}")]
    RateLimited { body: String },

    #[error("Upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

impl DispatchError {
    /// Request URLs can embed API keys, so they are stripped before the error
    /// reaches any log line
    fn transport(err: reqwest::Error) -> Self {
        DispatchError::Transport(err.without_url())
    }

    /// 429 and 5xx are transient; everything else fails immediately
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::RateLimited { .. } => true,
            DispatchError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            DispatchError::Upstream { status, .. } => Some(*status),
            DispatchError::Transport(e) => e.status().map(|s| s.as_u16()),
            DispatchError::Decode(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry; doubles for every retry after it
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.base_delay * 64)
            .with_factor(2.0)
            .with_max_times(self.max_retries)
    }
}

/// Sends requests to one upstream host through that host's limiter
#[derive(Debug, Clone)]
pub struct Dispatcher {
    http: Client,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(http: Client, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            http,
            limiter,
            retry,
        }
    }

    /// Send a request, retrying transient failures, and return the body of the
    /// first successful response
    pub async fn send(&self, spec: &RequestSpec) -> Result<String, DispatchError> {
        (|| self.attempt(spec))
            .retry(self.retry.backoff())
            .when(DispatchError::is_retryable)
            .notify(|err, delay| {
                warn!(
                    "Retrying {} in {:?} after error: {}",
                    spec.describe(),
                    delay,
                    err
                );
            })
            .await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, DispatchError> {
        let body = self.send(spec).await?;
        serde_json::from_str(&body).map_err(|e| DispatchError::Decode(e.to_string()))
    }

    async fn attempt(&self, spec: &RequestSpec) -> Result<String, DispatchError> {
        self.limiter.acquire().await;
        debug!("Dispatching {} via limiter {}", spec.describe(), self.limiter.name());

        let mut request = self.http.request(spec.method.clone(), &spec.url);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        for (key, value) in &spec.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(DispatchError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(DispatchError::transport)?;

        if status.is_success() {
            Ok(body)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(DispatchError::RateLimited { body })
        } else {
            Err(DispatchError::Upstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let limited = DispatchError::RateLimited { body: String::new() };
        assert!(limited.is_retryable());
        assert_eq!(limited.status(), Some(429));

        let unavailable = DispatchError::Upstream { status: 503, body: String::new() };
        assert!(unavailable.is_retryable());

        let not_found = DispatchError::Upstream { status: 404, body: String::new() };
        assert!(!not_found.is_retryable());

        assert!(!DispatchError::Decode("bad json".to_string()).is_retryable());
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }
}
