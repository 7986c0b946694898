//! Fixed-window in-memory rate limiting keyed by client IP (or authenticated
//! user when available).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::auth::AuthenticatedUser;

/// Numeric strings are always valid header values.
fn num_to_header_value<T: ToString>(n: T) -> http::HeaderValue {
    http::HeaderValue::from_str(&n.to_string())
        .unwrap_or_else(|_| http::HeaderValue::from_static("0"))
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_duration: Duration,
    pub enable_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_duration: Duration::from_secs(60),
            enable_headers: true,
        }
    }
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

impl WindowEntry {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, WindowEntry>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn check(&self, key: &str) -> RateLimitResult {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(WindowEntry::new);

        let now = Instant::now();
        if now.duration_since(entry.window_start) >= self.config.window_duration {
            entry.count = 0;
            entry.window_start = now;
        }

        let reset_after = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.window_start));

        if entry.count >= self.config.requests_per_window {
            return RateLimitResult {
                allowed: false,
                limit: self.config.requests_per_window,
                remaining: 0,
                reset_after,
            };
        }

        entry.count += 1;
        RateLimitResult {
            allowed: true,
            limit: self.config.requests_per_window,
            remaining: self.config.requests_per_window - entry.count,
            reset_after,
        }
    }

    /// Drops windows that have been idle past their duration.
    pub fn cleanup_expired(&self) {
        let window = self.config.window_duration;
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < window);
    }
}

/// Periodic sweep of expired windows.
pub async fn start_cleanup_task(limiter: RateLimiter, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        limiter.cleanup_expired();
    }
}

fn client_key(request: &Request) -> String {
    if let Some(user) = request.extensions().get::<AuthenticatedUser>() {
        return format!("user:{}", user.user_id);
    }

    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return format!("ip:{}", ip.trim());
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return format!("ip:{}", ip_str);
        }
    }

    "ip:unknown".to_string()
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let result = limiter.check(&key);
    let enable_headers = limiter.config().enable_headers;

    if !result.allowed {
        warn!(key = %key, "rate limit exceeded");
        let mut response =
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
        if enable_headers {
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
            headers.insert("X-RateLimit-Remaining", num_to_header_value(0));
            headers.insert(
                "X-RateLimit-Reset",
                num_to_header_value(result.reset_after.as_secs()),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    if enable_headers {
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", num_to_header_value(result.limit));
        headers.insert("X-RateLimit-Remaining", num_to_header_value(result.remaining));
        headers.insert(
            "X-RateLimit-Reset",
            num_to_header_value(result.reset_after.as_secs()),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_window: limit,
            window_duration: Duration::from_millis(window_ms),
            enable_headers: true,
        })
    }

    #[test]
    fn requests_over_limit_are_rejected() {
        let limiter = limiter(3, 60_000);
        for _ in 0..3 {
            assert!(limiter.check("ip:1.2.3.4").allowed);
        }
        let blocked = limiter.check("ip:1.2.3.4");
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
    }

    #[test]
    fn keys_are_tracked_independently() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.check("ip:1.1.1.1").allowed);
        assert!(limiter.check("ip:2.2.2.2").allowed);
        assert!(!limiter.check("ip:1.1.1.1").allowed);
    }

    #[test]
    fn window_expiry_resets_count() {
        let limiter = limiter(1, 10);
        assert!(limiter.check("ip:1.2.3.4").allowed);
        assert!(!limiter.check("ip:1.2.3.4").allowed);
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.check("ip:1.2.3.4").allowed);
    }

    #[test]
    fn cleanup_drops_idle_windows() {
        let limiter = limiter(5, 10);
        limiter.check("ip:1.2.3.4");
        std::thread::sleep(Duration::from_millis(15));
        limiter.cleanup_expired();
        assert!(limiter.entries.is_empty());
    }
}
