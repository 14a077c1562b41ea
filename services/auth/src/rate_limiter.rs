//! Rate limiter for login attempts, keyed by the submitted email

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    last_attempt: Instant,
    ban_expires: Option<Instant>,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    /// Forget the history of `key`, called after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;

        let window = Duration::from_secs(self.config.window_seconds);
        entries.retain(|_, entry| {
            let banned = entry.ban_expires.is_some_and(|expires| now < expires);
            banned || now.saturating_duration_since(entry.last_attempt) < window
        });

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            last_attempt: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.saturating_duration_since(entry.last_attempt) >= window {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned login key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts,
            window_seconds: 60,
            ban_duration_seconds: 120,
        })
    }

    #[tokio::test]
    async fn test_blocks_after_max_attempts() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.is_allowed("cook@example.com").await);
        }
        assert!(!limiter.is_allowed("cook@example.com").await);
        assert!(limiter.is_allowed("other@example.com").await);
    }

    #[tokio::test]
    async fn test_ban_expires() {
        let limiter = limiter(1);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).await);
        assert!(!limiter.check_at("k", start).await);
        assert!(!limiter.check_at("k", start + Duration::from_secs(119)).await);
        assert!(limiter.check_at("k", start + Duration::from_secs(121)).await);
    }

    #[tokio::test]
    async fn test_window_resets_attempts() {
        let limiter = limiter(2);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).await);
        assert!(limiter.check_at("k", start).await);
        assert!(limiter.check_at("k", start + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let limiter = limiter(1);
        assert!(limiter.is_allowed("k").await);
        limiter.reset("k").await;
        assert!(limiter.is_allowed("k").await);
    }

    #[tokio::test]
    async fn test_stale_keys_are_evicted() {
        let limiter = limiter(1);
        let start = Instant::now();
        assert!(limiter.check_at("stale", start).await);
        assert!(limiter.check_at("banned", start).await);
        assert!(!limiter.check_at("banned", start + Duration::from_secs(1)).await);

        assert!(limiter.check_at("fresh", start + Duration::from_secs(90)).await);
        let entries = limiter.entries.lock().await;
        assert!(!entries.contains_key("stale"));
        assert!(entries.contains_key("banned"));
        assert!(entries.contains_key("fresh"));
    }
}
