//! Consumer configuration

use uuid::Uuid;

/// Configuration for a stream consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Redis stream name
    pub stream_name: String,

    /// Consumer group name
    pub consumer_group: String,

    /// Unique consumer ID within the group (auto-generated)
    pub consumer_id: String,

    /// Blocking read timeout in milliseconds (None = non-blocking)
    pub block_timeout_ms: Option<u64>,

    /// Batch size for reading messages
    pub batch_size: usize,
}

impl ConsumerConfig {
    /// Create a config for a stream and consumer group.
    pub fn new(stream_name: impl Into<String>, consumer_group: impl Into<String>) -> Self {
        let consumer_group = consumer_group.into();
        Self {
            stream_name: stream_name.into(),
            consumer_id: format!("{}-{}", consumer_group, Uuid::new_v4()),
            consumer_group,
            block_timeout_ms: Some(5000),
            batch_size: 10,
        }
    }

    /// Set the consumer ID.
    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    /// Set the blocking timeout (None for non-blocking reads).
    pub fn with_blocking(mut self, timeout_ms: Option<u64>) -> Self {
        self.block_timeout_ms = timeout_ms;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}
