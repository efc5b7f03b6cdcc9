use std::{num::NonZeroU32, sync::Arc, time::Duration};

use axum::http::HeaderMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
};

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-client token bucket: `per_minute` tokens of capacity, refilled at
/// `per_minute` tokens every 60 seconds.
#[derive(Clone)]
pub struct SearchRateLimiter {
    limiter: Arc<KeyedLimiter>,
}

impl SearchRateLimiter {
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(per_minute);
        Self { limiter: Arc::new(RateLimiter::keyed(quota)) }
    }

    /// Takes one token for `key`; returns `true` when the bucket is empty.
    pub fn is_limited(&self, key: &str) -> bool {
        self.limiter.check_key(&key.to_string()).is_err()
    }

    /// Drops buckets that have fully refilled so idle clients do not accumulate.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn spawn_pruner(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            loop {
                tick.tick().await;
                this.prune();
                tracing::debug!(buckets = this.limiter.len(), "pruned search rate limiter");
            }
        })
    }
}

/// First `x-forwarded-for` hop, then `x-real-ip`, then `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bucket_allows_capacity_then_limits() {
        let limiter = SearchRateLimiter::per_minute(30);
        for _ in 0..30 {
            assert!(!limiter.is_limited("1.2.3.4"));
        }
        assert!(limiter.is_limited("1.2.3.4"));
        assert!(!limiter.is_limited("5.6.7.8"));
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_key(&headers), "10.0.0.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        assert_eq!(client_key(&headers), "203.0.113.7");

        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_key(&headers), "10.0.0.9");
    }
}
