//! PostgreSQL connector built on SeaORM.

use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use sea_orm::{ConnectOptions, Database, DbErr};
use std::time::Duration;
use tracing::info;

use crate::{retry, retry_with_backoff, RetryConfig};

// Re-export SeaORM types for convenience
pub use sea_orm::DatabaseConnection;

/// PostgreSQL configuration with connection pool settings
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    /// Database connection URL (required)
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 5,
            connect_timeout_secs: 8,
            acquire_timeout_secs: 8,
        }
    }

    /// Convert this config into SeaORM ConnectOptions
    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(&self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs));
        opt
    }
}

impl FromEnv for PostgresConfig {
    /// Environment variables:
    /// - `DATABASE_URL` (required)
    /// - `DB_MAX_CONNECTIONS` (default: 100)
    /// - `DB_MIN_CONNECTIONS` (default: 5)
    /// - `DB_CONNECT_TIMEOUT_SECS` (default: 8)
    /// - `DB_ACQUIRE_TIMEOUT_SECS` (default: 8)
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_required("DATABASE_URL")?;

        let parse = |key: &str, default: &str| -> Result<u64, ConfigError> {
            env_or_default(key, default)
                .parse()
                .map_err(|e| ConfigError::ParseError {
                    key: key.to_string(),
                    details: format!("{}", e),
                })
        };

        Ok(Self {
            url,
            max_connections: parse("DB_MAX_CONNECTIONS", "100")? as u32,
            min_connections: parse("DB_MIN_CONNECTIONS", "5")? as u32,
            connect_timeout_secs: parse("DB_CONNECT_TIMEOUT_SECS", "8")?,
            acquire_timeout_secs: parse("DB_ACQUIRE_TIMEOUT_SECS", "8")?,
        })
    }
}

/// Connect with custom connection options.
pub async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

/// Connect using a [`PostgresConfig`], retrying transient failures with
/// exponential backoff. Pass `None` for the default retry policy.
pub async fn connect_from_config_with_retry(
    config: PostgresConfig,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    let options = config.into_connect_options();

    match retry_config {
        Some(policy) => {
            retry_with_backoff(
                || {
                    let opts = options.clone();
                    connect_with_options(opts)
                },
                policy,
            )
            .await
        }
        None => {
            retry(|| {
                let opts = options.clone();
                connect_with_options(opts)
            })
            .await
        }
    }
}

/// Liveness check for readiness probes.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.ping().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_requires_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let result = PostgresConfig::from_env();
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/users")),
                ("DB_MAX_CONNECTIONS", None),
            ],
            || {
                let config = PostgresConfig::from_env().unwrap();
                assert_eq!(config.url, "postgresql://localhost/users");
                assert_eq!(config.max_connections, 100);
                assert_eq!(config.min_connections, 5);
            },
        );
    }

    #[test]
    fn test_config_from_env_invalid_pool_size() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/users")),
                ("DB_MAX_CONNECTIONS", Some("lots")),
            ],
            || {
                let result = PostgresConfig::from_env();
                assert!(result.is_err());
                assert!(result.unwrap_err().to_string().contains("DB_MAX_CONNECTIONS"));
            },
        );
    }
}
