//! Database connectors for PostgreSQL (SeaORM) and Redis.
//!
//! Provides configuration structs loadable from the environment and
//! connection helpers with retry/backoff for startup resilience.

pub mod postgres;
pub mod redis;
mod retry;

pub use retry::{retry, retry_with_backoff, RetryConfig};
