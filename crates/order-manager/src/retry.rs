//! Retry policy for broker calls
//!
//! Bounded exponential backoff over transient gateway errors. Permanent
//! errors (rejections, bad session) return immediately.

use std::future::Future;
use std::time::Duration;

use aegis_gateway::GatewayError;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            multiplier: 2,
        }
    }
}

/// Final outcome of a retried call
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, GatewayError>,
    pub attempts: u32,
}

impl<T> RetryOutcome<T> {
    /// Failed only because every attempt hit a transient error
    pub fn exhausted(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_transient())
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1` (attempt is 1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(attempt.saturating_sub(1));
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn is_retryable(&self, error: &GatewayError) -> bool {
        error.is_transient()
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(e) if self.is_retryable(&e) && attempt < max => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "[ORDERS] {} attempt {}/{} failed: {}, retrying in {:?}",
                        label, attempt, max, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return RetryOutcome {
                        result: Err(e),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_schedule_is_bounded() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
            multiplier: 2,
        };
        let delays: Vec<_> = (1..=6).map(|a| policy.backoff(a).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let outcome = RetryPolicy::default()
            .run("submit", move || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(GatewayError::Timeout("slow".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(outcome.result.unwrap(), 42);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_transient_error() {
        let outcome: RetryOutcome<()> = RetryPolicy::default()
            .run("submit", || async { Err(GatewayError::Unavailable("down".into())) })
            .await;
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let outcome: RetryOutcome<()> = RetryPolicy::default()
            .run("submit", || async { Err(GatewayError::Rejected("bad qty".into())) })
            .await;
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.exhausted());
    }
}
