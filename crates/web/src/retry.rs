use crate::config::RetryConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
    retry_client_errors: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
            retry_client_errors: false,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            retry_client_errors: config.retry_client_errors,
            ..Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Also retry errors that `is_transient` rejects
    pub fn retrying_client_errors(mut self) -> Self {
        self.retry_client_errors = true;
        self
    }

    /// Delay before retry number `attempt + 1`: doubles each time, capped
    fn backoff_for(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `f` until it succeeds, the retry budget is spent, or it fails
    /// with an error `is_transient` says will not go away.
    pub async fn retry<F, Fut, T, E, P>(
        &self,
        operation_name: &str,
        mut f: F,
        is_transient: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;

        loop {
            let error = match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            let retryable = self.retry_client_errors || is_transient(&error);
            if !retryable || attempt >= self.max_retries {
                if self.max_retries > 0 {
                    warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        retryable,
                        error = %error,
                        "Giving up"
                    );
                }
                return Err(error);
            }

            let backoff = self.backoff_for(attempt);
            warn!(
                operation = operation_name,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "Operation failed, retrying"
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let policy = RetryPolicy::new(3, 1, 4);
        let calls = AtomicUsize::new(0);

        let result: Result<usize, String> = policy
            .retry(
                "flaky",
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(format!("attempt {n}")) } else { Ok(n) }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_attempt_without_retries() {
        let policy = RetryPolicy::none();
        let calls = AtomicUsize::new(0);

        let result: Result<(), String> = policy
            .retry(
                "down",
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::new(3, 1, 4);
        let calls = AtomicUsize::new(0);

        let result: Result<(), u16> = policy
            .retry(
                "auth",
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(401)
                },
                |status| *status >= 500,
            )
            .await;

        assert_eq!(result, Err(401));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_errors_retried_when_configured() {
        let policy = RetryPolicy::new(2, 1, 4).retrying_client_errors();
        let calls = AtomicUsize::new(0);

        let result: Result<(), u16> = policy
            .retry(
                "auth",
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(401)
                },
                |status| *status >= 500,
            )
            .await;

        assert_eq!(result, Err(401));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::new(5, 100, 350);
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
    }
}
