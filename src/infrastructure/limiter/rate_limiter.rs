use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;

use crate::errors::AppError;

/// Admission verdict for one request from one client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow { remaining: u64 },
    Deny { retry_after_secs: u64 },
}

/// Per-client request accounting shared across all handler invocations.
///
/// Two backends exist: an in-process counter map for single-instance
/// deployments and a Redis counter for multi-instance ones. The choice is
/// made once at startup from configuration.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn allow(&self, key: &str) -> Result<Decision, AppError>;

    /// Drop expired accounting to bound memory. Backends with native TTLs
    /// have nothing to do here.
    async fn sweep_expired(&self) {}

    fn limit(&self) -> u64;
}

#[derive(Debug)]
struct WindowEntry {
    count: u64,
    reset_at: Instant,
}

/// Fixed-window counter per client key: first request opens a window, every
/// request inside it increments, requests past the cap are denied with the
/// seconds left until the window resets.
pub struct InMemoryRateLimiter {
    entries: DashMap<String, WindowEntry>,
    window: Duration,
    max_requests: u64,
}

impl InMemoryRateLimiter {
    pub fn new(window: Duration, max_requests: u64) -> Self {
        InMemoryRateLimiter {
            entries: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// One read-modify-write under the map's shard lock.
    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry { count: 0, reset_at: now + self.window });

        if entry.count == 0 || now >= entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return Decision::Allow { remaining: self.max_requests.saturating_sub(1) };
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            let remaining_ms = entry.reset_at.duration_since(now).as_millis() as u64;
            Decision::Deny {
                retry_after_secs: remaining_ms.div_ceil(1000).max(1),
            }
        } else {
            Decision::Allow { remaining: self.max_requests - entry.count }
        }
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.reset_at);
        before - self.entries.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn allow(&self, key: &str) -> Result<Decision, AppError> {
        Ok(self.check_at(key, Instant::now()))
    }

    async fn sweep_expired(&self) {
        let removed = self.sweep_at(Instant::now());
        if removed > 0 {
            tracing::debug!("rate limiter sweep removed {} expired entries", removed);
        }
    }

    fn limit(&self) -> u64 {
        self.max_requests
    }
}

/// Redis-backed counter for deployments with more than one instance. INCR
/// opens the window, EXPIRE bounds it, TTL yields the retry hint.
pub struct RedisRateLimiter {
    client: redis::Client,
    window: Duration,
    max_requests: u64,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client, window: Duration, max_requests: u64) -> Self {
        RedisRateLimiter { client, window, max_requests }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimiter {
    async fn allow(&self, key: &str) -> Result<Decision, AppError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::InternalError(format!("Rate limit store unavailable: {}", e)))?;

        let counter_key = format!("ratelimit:{}", key);
        let count: u64 = conn
            .incr(&counter_key, 1u64)
            .await
            .map_err(|e| AppError::InternalError(format!("Rate limit store error: {}", e)))?;

        if count == 1 {
            let _: () = conn
                .expire(&counter_key, self.window.as_secs() as i64)
                .await
                .map_err(|e| AppError::InternalError(format!("Rate limit store error: {}", e)))?;
        }

        if count > self.max_requests {
            let ttl: i64 = conn
                .ttl(&counter_key)
                .await
                .map_err(|e| AppError::InternalError(format!("Rate limit store error: {}", e)))?;
            Ok(Decision::Deny { retry_after_secs: ttl.max(1) as u64 })
        } else {
            Ok(Decision::Allow { remaining: self.max_requests - count })
        }
    }

    fn limit(&self) -> u64 {
        self.max_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn allows_up_to_the_cap_within_one_window() {
        let limiter = InMemoryRateLimiter::new(WINDOW, 120);
        let now = Instant::now();

        for _ in 0..120 {
            assert!(matches!(
                limiter.check_at("10.0.0.1", now),
                Decision::Allow { .. }
            ));
        }

        match limiter.check_at("10.0.0.1", now) {
            Decision::Deny { retry_after_secs } => assert!(retry_after_secs > 0),
            other => panic!("expected deny, got {:?}", other),
        }
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = InMemoryRateLimiter::new(WINDOW, 2);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("k", now), Decision::Allow { .. }));
        assert!(matches!(limiter.check_at("k", now), Decision::Allow { .. }));
        assert!(matches!(limiter.check_at("k", now), Decision::Deny { .. }));

        let later = now + WINDOW + Duration::from_secs(1);
        assert!(matches!(limiter.check_at("k", later), Decision::Allow { .. }));
    }

    #[test]
    fn retry_hint_is_the_ceiling_of_the_remaining_window() {
        let limiter = InMemoryRateLimiter::new(WINDOW, 1);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("k", now), Decision::Allow { .. }));
        let half_in = now + Duration::from_millis(30_500);
        match limiter.check_at("k", half_in) {
            Decision::Deny { retry_after_secs } => assert_eq!(retry_after_secs, 30),
            other => panic!("expected deny, got {:?}", other),
        }
    }

    #[test]
    fn keys_are_tracked_independently() {
        let limiter = InMemoryRateLimiter::new(WINDOW, 1);
        let now = Instant::now();

        assert!(matches!(limiter.check_at("a", now), Decision::Allow { .. }));
        assert!(matches!(limiter.check_at("b", now), Decision::Allow { .. }));
        assert!(matches!(limiter.check_at("a", now), Decision::Deny { .. }));
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let limiter = InMemoryRateLimiter::new(WINDOW, 10);
        let now = Instant::now();

        limiter.check_at("old", now);
        limiter.check_at("fresh", now + Duration::from_secs(30));

        let removed = limiter.sweep_at(now + WINDOW + Duration::from_secs(1));
        assert_eq!(removed, 1);

        // The surviving window keeps counting where it left off
        assert!(matches!(
            limiter.check_at("fresh", now + Duration::from_secs(31)),
            Decision::Allow { remaining: 8 }
        ));
    }
}
