use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Configuration for the retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl RetryConfig {
    /// Explorer proxy calls: 3 attempts, 350ms growing by 1.7x.
    pub fn explorer() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(350),
            multiplier: 1.7,
        }
    }

    /// Rate and signature lookups, which have their own fallbacks.
    pub fn lookup() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(200),
            multiplier: 1.7,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::explorer()
    }
}

/// Stateless retry policy. Computes the delay after a given failed attempt.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay to wait after the `attempt`-th failure (1-based), or `None`
    /// when no attempts remain.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.config.max_attempts {
            return None;
        }
        let base_ms = self.config.initial_backoff.as_millis() as f64
            * self.config.multiplier.powi((attempt - 1) as i32);
        Some(Duration::from_millis(base_ms.round() as u64))
    }

    /// Run `op` until it succeeds, returns an error `is_transient` rejects,
    /// or the attempts are exhausted. The last error is returned.
    pub async fn retry_if<F, Fut, T, E, C>(&self, label: &str, mut op: F, is_transient: C) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_transient(&err) => return Err(err),
                Err(err) => match self.next_delay(attempt) {
                    Some(delay) => {
                        debug!(%label, attempt, ?delay, error = %err, "retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!(%label, attempts = attempt, error = %err, "giving up");
                        return Err(err);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn explorer_backoff_schedule() {
        let policy = RetryPolicy::new(RetryConfig::explorer());
        assert_eq!(policy.next_delay(1), Some(Duration::from_millis(350)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_millis(595)));
        assert!(policy.next_delay(3).is_none());
    }

    #[test]
    fn single_attempt_never_delays() {
        let policy = RetryPolicy::new(RetryConfig::immediate(1));
        assert!(policy.next_delay(1).is_none());
    }

    #[tokio::test]
    async fn exhausts_after_exactly_max_attempts() {
        let policy = RetryPolicy::new(RetryConfig::immediate(3));
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = policy
            .retry_if(
                "test",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { Err(format!("failure {n}")) }
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), "failure 3");
    }

    #[tokio::test]
    async fn stops_on_first_success() {
        let policy = RetryPolicy::new(RetryConfig::immediate(3));
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = policy
            .retry_if(
                "test",
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { if n < 2 { Err("flaky".to_string()) } else { Ok(n) } }
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let policy = RetryPolicy::new(RetryConfig::immediate(3));
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = policy
            .retry_if(
                "test",
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("bad request".to_string()) }
                },
                |e| e != "bad request",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
