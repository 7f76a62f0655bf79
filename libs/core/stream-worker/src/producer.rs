//! Stream producer for publishing events
//!
//! Generic producer that appends serialized events to a Redis stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use stream_worker::StreamProducer;
//!
//! let producer = StreamProducer::new(redis, "user-events");
//! let stream_id = producer.send_keyed("42", &event).await?;
//! ```

use crate::error::StreamError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Generic stream producer for publishing events.
///
/// Payloads are serialized to JSON and stored in the `event` field of each
/// stream entry. An optional routing key travels in the `key` field so
/// consumers can partition or correlate entries without parsing the payload.
pub struct StreamProducer {
    redis: Arc<ConnectionManager>,
    stream_name: String,
    max_length: i64,
}

impl StreamProducer {
    /// Create a new StreamProducer for a specific stream.
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis: Arc::new(redis),
            stream_name: stream_name.into(),
            max_length: 100_000,
        }
    }

    /// Create from an Arc<ConnectionManager> (for sharing connections).
    pub fn from_arc(redis: Arc<ConnectionManager>, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
            max_length: 100_000,
        }
    }

    /// Set the maximum stream length (MAXLEN ~).
    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    /// Get the stream name.
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Publish an event.
    ///
    /// Returns the Redis stream entry ID.
    pub async fn send<E: Serialize>(&self, event: &E) -> Result<String, StreamError> {
        let mut conn = (*self.redis).clone();

        let event_json = serde_json::to_string(event)?;

        // XADD with MAXLEN ~ for approximate trimming (more efficient)
        let stream_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("event")
            .arg(&event_json)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            stream_id = %stream_id,
            "Published event"
        );

        Ok(stream_id)
    }

    /// Publish an event with a routing key.
    ///
    /// The key is stored as a separate `key` field next to the payload.
    pub async fn send_keyed<E: Serialize>(
        &self,
        key: &str,
        event: &E,
    ) -> Result<String, StreamError> {
        let mut conn = (*self.redis).clone();

        let event_json = serde_json::to_string(event)?;

        let stream_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("event")
            .arg(&event_json)
            .arg("key")
            .arg(key)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            stream_id = %stream_id,
            key = %key,
            "Published keyed event"
        );

        Ok(stream_id)
    }

    /// Get the current stream length.
    pub async fn stream_length(&self) -> Result<i64, StreamError> {
        let mut conn = (*self.redis).clone();
        let len: i64 = conn.xlen(&self.stream_name).await?;
        Ok(len)
    }
}

impl Clone for StreamProducer {
    fn clone(&self) -> Self {
        Self {
            redis: self.redis.clone(),
            stream_name: self.stream_name.clone(),
            max_length: self.max_length,
        }
    }
}
