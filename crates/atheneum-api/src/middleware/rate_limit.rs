//! In-memory HTTP rate limiting.
//!
//! Request-count sliding window per client identifier, applied before any
//! auth logic. Two instances exist at runtime: the general `/api` limiter and
//! a stricter one on the login route. The login limiter's ceiling sits above
//! the lockout threshold so the lockout's `ACCOUNT_LOCKED` response stays the
//! deciding control for credential abuse; this limiter is a flood backstop.
//!
//! Sharded (hashed key -> shard) to keep lock contention down, with
//! capacity-bounded shards and expiry cleanup so hostile clients cannot grow
//! memory without bound.

use crate::utils::ip::{client_id, trusted_proxy_count};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const SHARD_COUNT: usize = 16;
const MAX_BUCKETS_PER_SHARD: usize = 10_000;

#[derive(Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

impl Bucket {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + window,
        }
    }

    fn check_and_increment(&mut self, limit: u32, window: Duration) -> (bool, u32) {
        let now = Instant::now();
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        if self.count < limit {
            self.count += 1;
            (true, limit.saturating_sub(self.count))
        } else {
            (false, 0)
        }
    }

    fn reset_in(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }
}

/// Sharded request-count limiter.
#[derive(Clone)]
pub struct HttpRateLimiter {
    shards: Vec<Arc<Mutex<HashMap<String, Bucket>>>>,
    limit: u32,
    window: Duration,
}

impl HttpRateLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn shard_for(&self, key: &str) -> &Arc<Mutex<HashMap<String, Bucket>>> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Check and count one request. Returns the remaining budget, or the time
    /// until the window resets when the request is over the limit.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let shard = self.shard_for(key);
        let mut buckets = shard.lock().await;

        if buckets.len() >= MAX_BUCKETS_PER_SHARD {
            let now = Instant::now();
            buckets.retain(|_, bucket| bucket.reset_at > now);

            // Still at capacity: evict the bucket closest to expiry.
            if buckets.len() >= MAX_BUCKETS_PER_SHARD {
                if let Some(oldest) = buckets
                    .iter()
                    .min_by_key(|(_, bucket)| bucket.reset_at)
                    .map(|(k, _)| k.clone())
                {
                    buckets.remove(&oldest);
                }
            }
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.window));

        let (allowed, remaining) = bucket.check_and_increment(self.limit, self.window);
        if allowed {
            Ok(remaining)
        } else {
            Err(bucket.reset_in())
        }
    }

    /// Drop expired buckets from every shard.
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut cleaned = 0;
        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before = buckets.len();
            buckets.retain(|_, bucket| bucket.reset_at > now);
            cleaned += before - buckets.len();
        }
        if cleaned > 0 {
            tracing::debug!(buckets_cleaned = cleaned, "Cleaned up expired rate limit buckets");
        }
    }

    /// Spawn a periodic cleanup of expired buckets.
    pub fn spawn_cleanup(self: Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
            interval.tick().await;
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        })
    }
}

/// Rate limiting middleware; keyed on the client identifier.
///
/// Adds `X-RateLimit-Limit` / `X-RateLimit-Remaining` headers on allowed
/// requests and `Retry-After` on 429s.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<HttpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_id(request.headers(), socket_addr, trusted_proxy_count());

    match limiter.check(&key).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;
            set_header(&mut response, "X-RateLimit-Limit", &limiter.limit().to_string());
            set_header(&mut response, "X-RateLimit-Remaining", &remaining.to_string());
            response
        }
        Err(reset_in) => {
            tracing::warn!(
                client_id = %key,
                path = %request.uri().path(),
                limit = limiter.limit(),
                "Rate limit exceeded"
            );

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(serde_json::json!({
                    "error": "Too many requests from this IP, please try again later.",
                    "code": "RATE_LIMITED",
                })),
            )
                .into_response();

            set_header(&mut response, "X-RateLimit-Limit", &limiter.limit().to_string());
            set_header(&mut response, "X-RateLimit-Remaining", "0");
            set_header(
                &mut response,
                "Retry-After",
                &reset_in.as_secs().max(1).to_string(),
            );
            response
        }
    }
}

fn set_header(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(header_value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, header_value);
    }
}
