use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy for connection attempts
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay_ms: u64) -> Self {
        self.initial_delay_ms = initial_delay_ms;
        self
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms * 2u64.saturating_pow(attempt);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
        }
    }
}

/// Retry an async operation with the default policy.
pub async fn retry<T, E, F, Fut>(op: F) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_backoff(op, RetryConfig::default()).await
}

/// Retry an async operation with exponential backoff.
///
/// The operation is attempted `max_retries + 1` times in total; the last
/// error is returned when all attempts fail.
pub async fn retry_with_backoff<T, E, F, Fut>(op: F, config: RetryConfig) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Connection attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
