//! Timeout + bounded retry with exponential backoff for provider calls.

use std::{future::Future, time::Duration};

use tracing::{debug, warn};

use crate::error_handler::{AiLlmError, Result, env_opt_u32};

/// Retry policy applied to generation calls.
///
/// Each attempt is bounded by `attempt_timeout`. Transient failures (see
/// [`AiLlmError::is_transient`]) are retried up to `max_retries` extra times,
/// sleeping `base_delay * 2^n` between attempts, or the server's `Retry-After`
/// when it is longer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Reads `LLM_MAX_RETRIES` and uses `timeout_secs` as the per-attempt bound.
    pub fn from_env(timeout_secs: Option<u64>) -> Result<Self> {
        let mut policy = Self::default();
        if let Some(n) = env_opt_u32("LLM_MAX_RETRIES")? {
            policy.max_retries = n;
        }
        if let Some(secs) = timeout_secs {
            policy.attempt_timeout = Duration::from_secs(secs);
        }
        Ok(policy)
    }

    /// Backoff before retry number `retry` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        let exp = self.base_delay.saturating_mul(factor).min(self.max_delay);
        match hint {
            Some(h) => h.min(self.max_delay).max(exp),
            None => exp,
        }
    }

    /// Runs `op` under the policy.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or the first
    /// non-transient error immediately.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0u32;
        loop {
            let outcome = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(res) => res,
                Err(_) => Err(AiLlmError::Timeout(self.attempt_timeout)),
            };

            match outcome {
                Ok(v) => {
                    if retry > 0 {
                        debug!(label, retries = retry, "call succeeded after retry");
                    }
                    return Ok(v);
                }
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    let delay = self.delay_for(retry, err.retry_after());
                    warn!(
                        label,
                        attempt = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
