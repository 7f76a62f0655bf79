//! Downstream consumption of user events.
//!
//! `UserEventHandler` is the pluggable seam for services reacting to
//! user changes (cache invalidation, notifications, search indexing).
//! `UserEventProcessor` adapts a handler to the generic stream worker.

use async_trait::async_trait;
use std::sync::Arc;
use stream_worker::{EventProcessor, StreamError, StreamEvent};
use tracing::{debug, info};

use crate::events::{EventKind, UserEvent};

/// Handler for user events, dispatched by event type.
///
/// Default implementations log and succeed; implement only the hooks
/// a service cares about.
#[async_trait]
pub trait UserEventHandler: Send + Sync {
    async fn on_created(&self, event: &UserEvent) -> Result<(), StreamError> {
        info!(
            user_id = %event.user_id,
            name = %event.name,
            email = %event.email,
            "User created"
        );
        Ok(())
    }

    async fn on_updated(&self, event: &UserEvent) -> Result<(), StreamError> {
        info!(
            user_id = %event.user_id,
            name = %event.name,
            email = %event.email,
            "User updated"
        );
        Ok(())
    }

    async fn on_deleted(&self, event: &UserEvent) -> Result<(), StreamError> {
        info!(user_id = %event.user_id, email = %event.email, "User deleted");
        Ok(())
    }
}

/// Handler that only logs (the default hook bodies).
#[derive(Debug, Default, Clone)]
pub struct LoggingEventHandler;

#[async_trait]
impl UserEventHandler for LoggingEventHandler {}

/// Adapts a `UserEventHandler` to the generic stream worker.
pub struct UserEventProcessor<H: UserEventHandler> {
    handler: Arc<H>,
}

impl<H: UserEventHandler> UserEventProcessor<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn with_arc_handler(handler: Arc<H>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H: UserEventHandler> EventProcessor<UserEvent> for UserEventProcessor<H> {
    async fn process(&self, event: &StreamEvent<UserEvent>) -> Result<(), StreamError> {
        debug!(
            stream_id = %event.stream_id,
            user_id = %event.payload.user_id,
            event_type = %event.payload.event_type,
            "Dispatching user event"
        );

        match event.payload.event_type {
            EventKind::Created => self.handler.on_created(&event.payload).await,
            EventKind::Updated => self.handler.on_updated(&event.payload).await,
            EventKind::Deleted => self.handler.on_deleted(&event.payload).await,
        }
    }

    fn name(&self) -> &'static str {
        "UserEventProcessor"
    }
}
