//! Users Domain
//!
//! Complete domain implementation for user management with
//! change-notification events.
//!
//! # Features
//!
//! - User CRUD operations
//! - Pagination, sorting and filtering
//! - Fire-and-forget event publication to Redis Streams
//! - Pluggable downstream event handling
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │   Service   │────▶│   Events    │  ← publish after every mutation
//! └──────┬──────┘     └──────┬──────┘
//!        │                   │
//! ┌──────▼──────┐     ┌──────▼──────┐
//! │ Repository  │     │  Listener   │  ← downstream consumers
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     events::RedisEventPublisher,
//!     handlers,
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//!     streams::EventTopics,
//! };
//!
//! # fn demo(redis: redis::aio::ConnectionManager) {
//! let repository = InMemoryUserRepository::new();
//! let publisher = RedisEventPublisher::new(redis, EventTopics::from_env());
//! let service = UserService::new(repository, publisher);
//!
//! let router = handlers::router(service);
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod events;
pub mod handlers;
pub mod listener;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod streams;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use events::{EventKind, RedisEventPublisher, UserEvent, UserEventPublisher};
pub use listener::{LoggingEventHandler, UserEventHandler, UserEventProcessor};
pub use models::{
    CreateUserRequest, NewUser, Role, UpdateUserRequest, User, UserListResponse, UserQuery,
    UserResponse,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
pub use streams::EventTopics;
