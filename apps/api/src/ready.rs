//! Readiness probe checking the service's backing stores.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;
use serde_json::Value;

#[derive(Clone)]
struct ReadyState {
    db: DatabaseConnection,
    redis: ConnectionManager,
}

/// Router exposing `/ready`, probing PostgreSQL and Redis concurrently.
pub fn router(db: DatabaseConnection, redis: ConnectionManager) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(ReadyState { db, redis })
}

async fn ready(
    State(state): State<ReadyState>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "redis",
            Box::pin(async {
                database::redis::check_health(&state.redis)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
    ];

    run_health_checks(checks).await
}
