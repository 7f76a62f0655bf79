//! Stream Worker
//!
//! A small Redis Streams layer for publishing and consuming domain events.
//!
//! ## Features
//!
//! - **Producer**: `XADD` with approximate stream trimming and an optional
//!   routing key carried alongside the payload
//! - **Consumer groups**: independent fan-out per group, blocking reads,
//!   pending-entry drain on startup
//! - **Worker loop**: `StreamWorker<E, P>` drives an [`EventProcessor`]
//!   with watch-channel shutdown
//!
//! ## Example
//!
//! ```ignore
//! let producer = StreamProducer::new(redis.clone(), "user-events");
//! producer.send_keyed("42", &event).await?;
//!
//! let config = ConsumerConfig::new("user-events", "user-events-workers");
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod error;
mod producer;
mod worker;

pub use config::ConsumerConfig;
pub use consumer::{StreamConsumer, StreamEvent};
pub use error::StreamError;
pub use producer::StreamProducer;
pub use worker::{EventProcessor, StreamWorker};
