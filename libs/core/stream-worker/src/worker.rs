//! Core worker trait and the generic StreamWorker implementation.
//!
//! This module provides:
//! - `EventProcessor` trait for event handlers
//! - `StreamWorker` struct for running the consume loop

use crate::config::ConsumerConfig;
use crate::consumer::{StreamConsumer, StreamEvent};
use crate::error::StreamError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Trait for event processors.
///
/// Domain handlers implement this trait to process events from a stream.
///
/// # Example
///
/// ```rust,ignore
/// struct AuditProcessor;
///
/// #[async_trait]
/// impl EventProcessor<UserEvent> for AuditProcessor {
///     async fn process(&self, event: &StreamEvent<UserEvent>) -> Result<(), StreamError> {
///         info!(user_id = event.payload.user_id, "User changed");
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "AuditProcessor"
///     }
/// }
/// ```
#[async_trait]
pub trait EventProcessor<E>: Send + Sync {
    /// Process a single event.
    async fn process(&self, event: &StreamEvent<E>) -> Result<(), StreamError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;
}

/// Generic stream worker that feeds events to a processor.
///
/// The worker owns the consume loop:
/// - Consumer group creation on startup
/// - Pending entry drain (entries delivered before a crash)
/// - Blocking reads for new entries
/// - Graceful shutdown via a watch channel
///
/// Processing failures are logged and the entry is acknowledged anyway;
/// a consumer that cannot handle an event must not stall the stream.
pub struct StreamWorker<E, P>
where
    E: DeserializeOwned + Send + Sync,
    P: EventProcessor<E>,
{
    consumer: StreamConsumer,
    processor: Arc<P>,
    config: ConsumerConfig,
    _phantom: PhantomData<E>,
}

impl<E, P> StreamWorker<E, P>
where
    E: DeserializeOwned + Send + Sync + 'static,
    P: EventProcessor<E> + 'static,
{
    /// Create a new stream worker.
    pub fn new(redis: Arc<ConnectionManager>, processor: P, config: ConsumerConfig) -> Self {
        let consumer = StreamConsumer::new(redis, config.clone());

        Self {
            consumer,
            processor: Arc::new(processor),
            config,
            _phantom: PhantomData,
        }
    }

    /// Create a new stream worker with an Arc processor.
    pub fn with_arc_processor(
        redis: Arc<ConnectionManager>,
        processor: Arc<P>,
        config: ConsumerConfig,
    ) -> Self {
        let consumer = StreamConsumer::new(redis, config.clone());

        Self {
            consumer,
            processor,
            config,
            _phantom: PhantomData,
        }
    }

    /// Get a reference to the consumer.
    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Run the worker loop.
    ///
    /// Continuously reads events from the stream and processes them.
    /// Use the shutdown receiver to gracefully stop the worker.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            processor = %self.processor.name(),
            "Starting stream worker"
        );

        self.consumer.init_consumer_group().await?;

        // Drain entries delivered to this consumer before a previous crash
        match self.consumer.read_pending::<E>().await {
            Ok(pending) => {
                if !pending.is_empty() {
                    warn!(count = pending.len(), "Re-processing pending entries");
                    for event in &pending {
                        self.process_event(event).await;
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to read pending entries on startup"),
        }

        let mut consecutive_errors: u32 = 0;
        const MAX_BACKOFF_SECS: u64 = 30;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            let batch = tokio::select! {
                _ = shutdown.changed() => continue,
                result = self.consumer.read_new::<E>() => result,
            };

            match batch {
                Ok(events) => {
                    if consecutive_errors > 0 {
                        info!(
                            consecutive_errors = %consecutive_errors,
                            "Connection recovered"
                        );
                        consecutive_errors = 0;
                    }

                    for event in &events {
                        self.process_event(event).await;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    let backoff_secs =
                        std::cmp::min(2u64.pow(consecutive_errors.min(5)), MAX_BACKOFF_SECS);
                    warn!(
                        error = %e,
                        consecutive_errors = %consecutive_errors,
                        backoff_secs = %backoff_secs,
                        "Error reading from stream, backing off"
                    );

                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
                    }
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Process a single event and acknowledge it.
    async fn process_event(&self, event: &StreamEvent<E>) {
        debug!(
            stream_id = %event.stream_id,
            processor = %self.processor.name(),
            "Processing event"
        );

        if let Err(e) = self.processor.process(event).await {
            warn!(
                stream_id = %event.stream_id,
                processor = %self.processor.name(),
                error = %e,
                "Event processing failed"
            );
        }

        // Ack regardless of the processing outcome
        if let Err(e) = self.consumer.ack(&event.stream_id).await {
            error!(
                stream_id = %event.stream_id,
                error = %e,
                "Failed to ACK entry"
            );
        }
    }
}
