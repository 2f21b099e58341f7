//! Bounded retry with exponential backoff for mutating operations.
//!
//! A single-file store intermittently rejects a write while another
//! writer's transaction is in flight. Those windows are sub-second, so
//! every mutating service function runs through [`RetryPolicy::run`]
//! instead of failing the request on the first `Busy`.

use std::future::Future;
use std::time::Duration;

use crate::domain::DomainError;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            backoff: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying only on [`DomainError::Busy`]. The delay doubles
    /// each attempt; exhaustion propagates the final `Busy`, every other
    /// error propagates unmodified on first occurrence.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut delay = self.initial_delay;
        for attempt in 1..=self.max_attempts {
            match op().await {
                Err(DomainError::Busy) if attempt < self.max_attempts => {
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "store busy, retrying write"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.backoff);
                }
                other => return other,
            }
        }
        Err(DomainError::Busy)
    }
}
