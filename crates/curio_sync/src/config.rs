//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for the sync engine and its components.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum pending mutations held while offline. At capacity the
    /// oldest entry is evicted before the newest is appended.
    pub max_queue_size: usize,
    /// Retry behavior for failed replays.
    pub retry: RetryConfig,
    /// Outbound call throttling.
    pub rate_limit: RateLimitConfig,
}

impl SyncConfig {
    /// Creates a configuration with the standard defaults.
    pub fn new() -> Self {
        Self {
            max_queue_size: 1000,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Sets the mutation queue capacity.
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the rate limit configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for failed-mutation retry.
///
/// A mutation that keeps failing is not requeued forever: once its
/// attempt count reaches `max_attempts` it is dead-lettered instead.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Replay attempts before a mutation is dead-lettered.
    pub max_attempts: u32,
    /// Maximum dead-lettered mutations kept for inspection.
    pub dead_letter_capacity: usize,
}

impl RetryConfig {
    /// Creates a retry configuration with the given attempt cap.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            dead_letter_capacity: 100,
        }
    }

    /// Sets the dead-letter buffer capacity.
    pub fn with_dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.dead_letter_capacity = capacity;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Configuration for the sliding-window rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum calls allowed inside one window.
    pub max_calls: u32,
    /// Length of the trailing window.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Creates a rate limit of `max_calls` per `window`.
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self { max_calls, window }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.max_queue_size, 1000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new()
            .with_max_queue_size(3)
            .with_retry(RetryConfig::new(2).with_dead_letter_capacity(10))
            .with_rate_limit(RateLimitConfig::new(10, Duration::from_secs(60)));

        assert_eq!(config.max_queue_size, 3);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.dead_letter_capacity, 10);
        assert_eq!(config.rate_limit.max_calls, 10);
    }
}
