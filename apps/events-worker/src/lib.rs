//! User Events Worker Service
//!
//! A background worker that consumes user change events from Redis streams.
//!
//! ## Architecture
//!
//! ```text
//! Redis Streams (user-events, user-created, user-updated, user-deleted)
//!   ↓ (independent consumer groups per stream)
//! StreamWorker<UserEvent, UserEventProcessor>
//!   ↓
//! UserEventHandler (logging, downstream integrations)
//! ```
//!
//! The catch-all `user-events` stream and the three per-type streams each get
//! their own worker loop and consumer group, so a slow consumer on one stream
//! never holds back the others.

use core_config::{Environment, FromEnv, app_info, env_or_default};
use database::redis::RedisConfig;
use domain_users::{
    EventTopics, LoggingEventHandler, UserEvent, UserEventHandler, UserEventProcessor,
};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use stream_worker::{ConsumerConfig, StreamWorker};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Spawn one worker loop for a single stream with its own consumer group.
fn spawn_worker<H>(
    redis: Arc<database::redis::ConnectionManager>,
    handler: Arc<H>,
    stream: &str,
    group: &str,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()>
where
    H: UserEventHandler + 'static,
{
    let config = ConsumerConfig::new(stream, group);
    info!(
        stream = %config.stream_name,
        consumer_group = %config.consumer_group,
        consumer_id = %config.consumer_id,
        "Worker configuration loaded"
    );
    let processor = UserEventProcessor::with_arc_handler(handler);
    let worker = StreamWorker::<UserEvent, _>::new(redis, processor, config);
    tokio::spawn(async move {
        if let Err(e) = worker.run(shutdown).await {
            error!(error = %e, "Worker loop terminated with error");
        }
    })
}

/// Run the user events worker
///
/// This is the main entry point for the worker. It:
/// 1. Sets up structured logging (env-aware: JSON for prod, pretty for dev)
/// 2. Connects to Redis for stream processing
/// 3. Starts one worker loop per event stream with graceful shutdown handling
///
/// # Errors
///
/// Returns an error if:
/// - Redis configuration is invalid
/// - Redis connection fails
pub async fn run() -> Result<()> {
    // Initialize tracing (env-aware: JSON for prod, pretty for dev)
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let app_info = app_info!();
    info!(name = %app_info.name, version = %app_info.version, "Starting user events worker");
    info!("Environment: {:?}", environment);

    // Load Redis configuration from the environment
    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;

    // Connect to Redis with retry logic
    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;
    info!("Connected to Redis successfully");
    let redis = Arc::new(redis);

    let topics = EventTopics::from_env();
    let base_group = env_or_default("CONSUMER_GROUP", "user-management-group");

    // Set up a shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    let handler = Arc::new(LoggingEventHandler);

    // One worker per stream: the catch-all group plus a derived group per
    // event type, so each stream tracks its own delivery cursor.
    let workers = vec![
        spawn_worker(
            redis.clone(),
            handler.clone(),
            &topics.all,
            &base_group,
            shutdown_rx.clone(),
        ),
        spawn_worker(
            redis.clone(),
            handler.clone(),
            &topics.created,
            &format!("{base_group}-created"),
            shutdown_rx.clone(),
        ),
        spawn_worker(
            redis.clone(),
            handler.clone(),
            &topics.updated,
            &format!("{base_group}-updated"),
            shutdown_rx.clone(),
        ),
        spawn_worker(
            redis,
            handler,
            &topics.deleted,
            &format!("{base_group}-deleted"),
            shutdown_rx,
        ),
    ];

    info!("User event consumers started");
    for worker in workers {
        if let Err(e) = worker.await {
            error!(error = %e, "Worker task panicked");
        }
    }

    info!("User events worker stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercises the config loading this binary performs at startup.
    #[test]
    fn test_redis_config_loads_from_env() {
        temp_env::with_var("REDIS_HOST", Some("redis://localhost:6379"), || {
            let config = RedisConfig::from_env().unwrap();
            assert_eq!(config.uri, "redis://localhost:6379");
        });
    }

    #[test]
    fn test_consumer_group_defaults() {
        temp_env::with_var_unset("CONSUMER_GROUP", || {
            let base = env_or_default("CONSUMER_GROUP", "user-management-group");
            assert_eq!(base, "user-management-group");
            assert_eq!(format!("{base}-created"), "user-management-group-created");
        });
    }
}
