//! Redis connector providing a shared [`ConnectionManager`].

use core_config::{env_required, ConfigError, FromEnv};
use redis::{Client, RedisError};
use tracing::info;

use crate::{retry, retry_with_backoff, RetryConfig};

// Re-export for convenience
pub use redis::aio::ConnectionManager;

/// Redis configuration
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub uri: String,
}

impl RedisConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl FromEnv for RedisConfig {
    /// Requires REDIS_HOST to be set (no default)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            uri: env_required("REDIS_HOST")?,
        })
    }
}

/// Connect and return a [`ConnectionManager`] that reconnects automatically.
pub async fn connect(uri: &str) -> Result<ConnectionManager, RedisError> {
    let client = Client::open(uri)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect using a [`RedisConfig`], retrying transient failures.
pub async fn connect_from_config_with_retry(
    config: RedisConfig,
    retry_config: Option<RetryConfig>,
) -> Result<ConnectionManager, RedisError> {
    match retry_config {
        Some(policy) => retry_with_backoff(|| connect(&config.uri), policy).await,
        None => retry(|| connect(&config.uri)).await,
    }
}

/// Liveness check for readiness probes.
pub async fn check_health(redis: &ConnectionManager) -> Result<(), RedisError> {
    let mut conn = redis.clone();
    redis::cmd("PING").query_async::<()>(&mut conn).await
}
