//! Fixed-interval request pacing.
//!
//! ClinicalTrials.gov allows roughly 50 requests per minute, so every request
//! goes through a [`RequestPacer`] that admits one request per interval. The
//! first request is admitted immediately.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::fmt;
use std::time::Duration;

/// Default spacing between requests (~40 requests/minute)
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1500);

/// Admits at most one request per configured interval
pub struct RequestPacer {
    limiter: Option<DefaultDirectRateLimiter>,
    interval: Duration,
}

impl RequestPacer {
    /// Create a pacer with the given spacing; a zero interval disables pacing
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        Self { limiter, interval }
    }

    /// A pacer that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until the next request may be sent
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}

impl fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPacer")
            .field("interval", &self.interval)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_interval_disables() {
        let pacer = RequestPacer::disabled();
        assert!(!pacer.is_enabled());
        assert_eq!(pacer.interval(), Duration::ZERO);
    }

    #[test]
    fn test_default_interval() {
        let pacer = RequestPacer::default();
        assert!(pacer.is_enabled());
        assert_eq!(pacer.interval(), DEFAULT_REQUEST_DELAY);
    }

    #[tokio::test]
    async fn test_disabled_never_waits() {
        let pacer = RequestPacer::disabled();
        let start = Instant::now();
        for _ in 0..10 {
            pacer.ready().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_request_is_spaced() {
        let pacer = RequestPacer::new(Duration::from_millis(200));

        let start = Instant::now();
        pacer.ready().await;
        let first = start.elapsed();

        pacer.ready().await;
        let second = start.elapsed();

        assert!(first < Duration::from_millis(150));
        assert!(second >= Duration::from_millis(150));
    }
}
