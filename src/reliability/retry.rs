//! Bounded fixed-delay retry on top of backon's constant backoff.

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};

use crate::error::Result;
use crate::validate;

/// Fixed-delay retry policy: `attempts` total tries with `delay` between
/// them; the last error is returned once attempts are exhausted.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    attempts: usize,
    delay: Duration,
}

impl Retry {
    pub fn new(attempts: usize, delay: Duration) -> Result<Self> {
        validate::positive(attempts, "retry attempts")?;
        Ok(Self { attempts, delay })
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    pub async fn run<T, E, Fut, F>(&self, op: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let backoff = ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.attempts.saturating_sub(1));
        op.retry(backoff).await
    }
}
