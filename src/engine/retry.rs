use std::time::Duration;

use tracing::{debug, warn};

use super::error::EngineError;
use crate::backend::KvClient;

/// Bounded retry with exponential backoff
///
/// The first attempt is not a retry: a write is tried at most
/// `1 + max_retries` times, and retry `i` (0-based) sleeps
/// `backoff_factor * 2^i` beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.backoff_factor.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Write `items` through `client`, retrying transient failures per `policy`
///
/// Returns the number of attempts used on success.
pub async fn write_with_retry<K>(
    client: &mut K,
    items: &[(String, Vec<u8>)],
    policy: &RetryPolicy,
) -> Result<u32, EngineError>
where
    K: KvClient + ?Sized,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match client.set_multi(items).await {
            Ok(()) => {
                debug!(shard = client.addr(), attempt, items = items.len(), "Batch stored");
                return Ok(attempt);
            }
            Err(err) => err,
        };

        if !err.is_transient() || attempt >= policy.total_attempts() {
            return Err(EngineError::RetriesExhausted {
                shard: client.addr().to_string(),
                attempts: attempt,
                source: err,
            });
        }

        let delay = policy.delay(attempt - 1);
        warn!(
            shard = client.addr(),
            attempt,
            max_attempts = policy.total_attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Backend write failed; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
