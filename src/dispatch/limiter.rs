use governor::{
    clock::MonotonicClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, MonotonicClock, NoOpMiddleware<Instant>>;

/// Minimum-spacing limiter for one upstream host.
///
/// Backed by a GCRA limiter with a burst of one, so two acquisitions are always
/// at least `spacing` apart no matter how many tasks race for it.
pub struct RateLimiter {
    name: String,
    spacing: Duration,
    inner: Option<DirectLimiter>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, spacing: Duration) -> Self {
        // A zero spacing disables limiting
        let inner = Quota::with_period(spacing)
            .map(|quota| GovernorLimiter::direct_with_clock(quota, MonotonicClock::default()));

        Self {
            name: name.into(),
            spacing,
            inner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Suspend until this host may be called again
    pub async fn acquire(&self) {
        if let Some(inner) = &self.inner {
            inner.until_ready().await;
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("spacing", &self.spacing)
            .finish()
    }
}

/// Hands out one shared limiter per upstream host (host and port)
#[derive(Debug)]
pub struct HostLimiters {
    spacing: Duration,
    limiters: HashMap<String, Arc<RateLimiter>>,
}

impl HostLimiters {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            limiters: HashMap::new(),
        }
    }

    pub fn for_url(&mut self, url: &str) -> Arc<RateLimiter> {
        let host = host_key(url);
        let spacing = self.spacing;

        self.limiters
            .entry(host.clone())
            .or_insert_with(|| {
                debug!("Creating rate limiter for {} with spacing {:?}", host, spacing);
                Arc::new(RateLimiter::new(host.clone(), spacing))
            })
            .clone()
    }
}

fn host_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port_or_known_default() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            }
        }
        // Unparseable URLs fail at dispatch time; give them their own bucket
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_one_limiter_per_host() {
        let mut limiters = HostLimiters::new(Duration::from_millis(500));

        let rpc = limiters.for_url("https://api.mainnet-beta.solana.com");
        let rpc_again = limiters.for_url("https://api.mainnet-beta.solana.com/");
        let prices = limiters.for_url("https://api.coingecko.com/api/v3");

        assert!(Arc::ptr_eq(&rpc, &rpc_again));
        assert!(!Arc::ptr_eq(&rpc, &prices));
        assert_eq!(rpc.name(), "api.mainnet-beta.solana.com:443");
    }

    #[test]
    fn test_ports_are_distinct_hosts() {
        let mut limiters = HostLimiters::new(Duration::from_millis(500));
        let a = limiters.for_url("http://127.0.0.1:4000");
        let b = limiters.for_url("http://127.0.0.1:4001/rpc");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_acquire_enforces_spacing() {
        let limiter = RateLimiter::new("test", Duration::from_millis(200));
        let started = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_zero_spacing_is_unlimited() {
        let limiter = RateLimiter::new("test", Duration::ZERO);
        let started = Instant::now();

        for _ in 0..20 {
            limiter.acquire().await;
        }

        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
