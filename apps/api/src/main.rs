use axum::Router;
use axum_helpers::{create_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{EventTopics, PgUserRepository, RedisEventPublisher, UserService, handlers};
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod ready;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre before any fallible operations
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Connect to both backing stores concurrently
    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };

    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };

    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    let repository = PgUserRepository::new(db.clone());
    let publisher = RedisEventPublisher::new(redis.clone(), EventTopics::from_env());
    let service = UserService::new(repository, publisher);

    // - /users/*: the user domain
    // - /health: liveness with app name/version
    // - /ready: readiness probing Postgres and Redis
    let app = Router::new()
        .nest("/users", handlers::router(service))
        .merge(health_router(config.app))
        .merge(ready::router(db.clone(), redis))
        .layer(TraceLayer::new_for_http());

    info!("Starting user API");

    create_app(app, &config.server).await?;

    info!("Shutting down: closing database connection");
    if let Err(e) = db.close().await {
        tracing::error!("Error closing PostgreSQL: {}", e);
    }

    info!("User API shutdown complete");
    Ok(())
}
