//! Stream consumer for Redis operations
//!
//! Handles reading entries from Redis streams using consumer groups.

use crate::config::ConsumerConfig;
use crate::error::StreamError;
use redis::aio::ConnectionManager;
use redis::RedisResult;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A stream entry with its payload and metadata.
#[derive(Debug, Clone)]
pub struct StreamEvent<E> {
    /// Redis stream entry ID (e.g., "1234567890123-0")
    pub stream_id: String,

    /// Routing key carried alongside the payload, if any
    pub key: Option<String>,

    /// The deserialized event payload
    pub payload: E,
}

/// Stream consumer for Redis operations.
pub struct StreamConsumer {
    redis: Arc<ConnectionManager>,
    config: ConsumerConfig,
}

impl StreamConsumer {
    /// Create a new StreamConsumer.
    pub fn new(redis: Arc<ConnectionManager>, config: ConsumerConfig) -> Self {
        Self { redis, config }
    }

    /// Get a reference to the Redis connection.
    pub fn redis(&self) -> Arc<ConnectionManager> {
        self.redis.clone()
    }

    /// Get the stream name.
    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    /// Get the consumer group.
    pub fn consumer_group(&self) -> &str {
        &self.config.consumer_group
    }

    /// Initialize the consumer group if it doesn't exist.
    pub async fn init_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = (*self.redis).clone();

        // Try to create the group, ignore error if it already exists
        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0") // Start from beginning
            .arg("MKSTREAM") // Create stream if it doesn't exist
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
            }
            Err(e) => return Err(StreamError::Redis(e)),
        }

        Ok(())
    }

    /// Read pending entries (delivered to this consumer but not acknowledged).
    pub async fn read_pending<E: DeserializeOwned>(
        &self,
    ) -> Result<Vec<StreamEvent<E>>, StreamError> {
        let mut conn = (*self.redis).clone();

        let result: RedisResult<Vec<(String, Vec<(String, Vec<(String, String)>)>)>> =
            redis::cmd("XREADGROUP")
                .arg("GROUP")
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_id)
                .arg("COUNT")
                .arg(self.config.batch_size)
                .arg("STREAMS")
                .arg(&self.config.stream_name)
                .arg("0") // Pending entries only
                .query_async(&mut conn)
                .await;

        match result {
            Ok(streams) => Ok(self.parse_stream_response(streams)),
            Err(e) if e.to_string().contains("NOGROUP") => {
                // Consumer group doesn't exist yet
                Ok(vec![])
            }
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Read new entries from the stream.
    pub async fn read_new<E: DeserializeOwned>(
        &self,
    ) -> Result<Vec<StreamEvent<E>>, StreamError> {
        let mut conn = (*self.redis).clone();

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id);

        if let Some(timeout) = self.config.block_timeout_ms {
            cmd.arg("BLOCK").arg(timeout);
        }

        cmd.arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">"); // Only new entries

        let result: RedisResult<Option<Vec<(String, Vec<(String, Vec<(String, String)>)>)>>> =
            cmd.query_async(&mut conn).await;

        match result {
            Ok(Some(streams)) => Ok(self.parse_stream_response(streams)),
            Ok(None) => Ok(vec![]), // No entries (blocking timeout)
            Err(e) if e.to_string().contains("NOGROUP") => {
                // Consumer group doesn't exist yet
                Ok(vec![])
            }
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Acknowledge an entry.
    pub async fn ack(&self, stream_id: &str) -> Result<(), StreamError> {
        let mut conn = (*self.redis).clone();

        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %stream_id, "Acknowledged entry");
        Ok(())
    }

    /// Parse stream response from XREADGROUP.
    fn parse_stream_response<E: DeserializeOwned>(
        &self,
        streams: Vec<(String, Vec<(String, Vec<(String, String)>)>)>,
    ) -> Vec<StreamEvent<E>> {
        let mut events = Vec::new();

        for (_stream_name, entries) in streams {
            events.extend(parse_entries(&self.config.stream_name, entries));
        }

        events
    }
}

/// Parse entries from a Redis stream response.
///
/// Entries without an `event` field or with an unparsable payload are
/// logged and skipped so a malformed entry cannot wedge the consumer.
fn parse_entries<E: DeserializeOwned>(
    stream_name: &str,
    entries: Vec<(String, Vec<(String, String)>)>,
) -> Vec<StreamEvent<E>> {
    let mut events = Vec::new();

    for (stream_id, fields) in entries {
        let payload_json = fields
            .iter()
            .find(|(k, _)| k == "event")
            .map(|(_, v)| v.as_str());

        let key = fields
            .iter()
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.clone());

        match payload_json {
            Some(json) => match serde_json::from_str::<E>(json) {
                Ok(payload) => {
                    events.push(StreamEvent {
                        stream_id,
                        key,
                        payload,
                    });
                }
                Err(e) => {
                    warn!(
                        stream = %stream_name,
                        stream_id = %stream_id,
                        error = %e,
                        "Failed to parse event payload, skipping"
                    );
                }
            },
            None => {
                warn!(
                    stream = %stream_name,
                    stream_id = %stream_id,
                    fields = ?fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                    "Missing 'event' field in entry, skipping"
                );
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestEvent {
        id: i64,
        action: String,
    }

    #[test]
    fn test_parse_entries() {
        let entries = vec![(
            "1234567890123-0".to_string(),
            vec![
                ("event".to_string(), r#"{"id":42,"action":"created"}"#.to_string()),
                ("key".to_string(), "42".to_string()),
            ],
        )];

        let events: Vec<StreamEvent<TestEvent>> = parse_entries("test-stream", entries);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].stream_id, "1234567890123-0");
        assert_eq!(events[0].key.as_deref(), Some("42"));
        assert_eq!(
            events[0].payload,
            TestEvent {
                id: 42,
                action: "created".to_string()
            }
        );
    }

    #[test]
    fn test_parse_entries_without_key() {
        let entries = vec![(
            "1-0".to_string(),
            vec![("event".to_string(), r#"{"id":1,"action":"deleted"}"#.to_string())],
        )];

        let events: Vec<StreamEvent<TestEvent>> = parse_entries("test-stream", entries);

        assert_eq!(events.len(), 1);
        assert!(events[0].key.is_none());
    }

    #[test]
    fn test_parse_entries_skips_malformed() {
        let entries = vec![
            ("1-0".to_string(), vec![("event".to_string(), "not json".to_string())]),
            ("2-0".to_string(), vec![("other".to_string(), "x".to_string())]),
            (
                "3-0".to_string(),
                vec![("event".to_string(), r#"{"id":7,"action":"updated"}"#.to_string())],
            ),
        ];

        let events: Vec<StreamEvent<TestEvent>> = parse_entries("test-stream", entries);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.id, 7);
    }
}
