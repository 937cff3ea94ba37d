//! Sliding-window rate limiter with explicit accept/reject.
//!
//! Unlike a debouncer, nothing is deferred: a rejected call is reported to
//! the caller as `false` so it can decide what to do, instead of being
//! silently dropped.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::Result;
use crate::validate;

/// Call budget over a sliding time window.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Allow at most `max_calls` within any `window`-sized span.
    pub fn new(max_calls: usize, window: Duration) -> Result<Self> {
        validate::positive(max_calls, "rate limit budget")?;
        validate::window(window, "rate limit window")?;
        Ok(Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::new()),
        })
    }

    /// Try to consume one slot. Returns whether the call is accepted.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock();
        while let Some(oldest) = calls.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    /// Slots currently available.
    pub fn available(&self) -> usize {
        let now = Instant::now();
        let calls = self.calls.lock();
        let live = calls
            .iter()
            .filter(|at| now.saturating_duration_since(**at) < self.window)
            .count();
        self.max_calls.saturating_sub(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn budget_is_enforced_within_the_window() {
        let limiter = RateLimiter::new(3, Duration::from_millis(100)).unwrap();
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100)).unwrap();
        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // 50ms later the first call has aged out, the second has not.
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn rejects_zero_budget_and_zero_window() {
        assert!(RateLimiter::new(0, Duration::from_millis(100)).is_err());
        assert!(RateLimiter::new(3, Duration::ZERO).is_err());
    }
}
