//! # Axum Helpers
//!
//! Shared utilities for building Axum services:
//!
//! - **[`errors`]**: structured error responses and the 404 fallback
//! - **[`extractors`]**: `ValidatedJson` (validator-backed request bodies)
//! - **[`health`]**: liveness router and concurrent readiness checks
//! - **[`server`]**: server startup with graceful shutdown

pub mod errors;
pub mod extractors;
pub mod health;
pub mod server;

pub use errors::ErrorResponse;
pub use extractors::ValidatedJson;
pub use health::{health_router, run_health_checks, HealthCheckFuture, HealthResponse};
pub use server::{create_app, shutdown_signal};
