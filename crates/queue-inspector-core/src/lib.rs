//! # Queue Inspector Core
//!
//! Read-only inspection of a Service Bus queue (or topic subscription) and
//! its dead-letter queue.
//!
//! This library provides:
//! - Inclusive datetime-range filtering of enqueue times
//! - Listing of message summaries by peeking an entity end to end
//! - Exact-position lookup of a single message by sequence number
//! - Configuration loading and dead-letter path derivation
//! - In-memory and Azure Service Bus backends
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all inspection operations
//! - [`filter`] - Time range predicate
//! - [`message`] - Message summaries and full message snapshots
//! - [`target`] - Queue, subscription and dead-letter target resolution
//! - [`client`] - Backend traits and the inspection client
//! - [`config`] - Configuration file loading
//! - [`providers`] - Backend implementations

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod message;
pub mod providers;
pub mod target;

// Re-export commonly used types at crate root for convenience
pub use client::{
    BackendConnector, InspectorClient, MessageReceiver, ReadKind, ReceiverFactory,
    DEFAULT_PEEK_BATCH_SIZE,
};
pub use config::{InspectorSettings, ServerSettings, ServiceBusSettings};
pub use error::{ConfigError, InspectorError, ProviderError, RangeError};
pub use filter::{in_range, TimeRange};
pub use message::{FullMessage, MessageDetails, MessageSummary, SequenceNumber, SystemProperties};
pub use providers::InMemoryServiceBus;
pub use target::{QueueTargets, ReceiverTarget};
