//! Queue access traits and the inspection client built on top of them.
//!
//! The client never talks to a broker directly. It depends on a
//! [`ReceiverFactory`] injected at construction, which opens
//! [`MessageReceiver`] handles for a [`ReceiverTarget`]. Each list or fetch
//! call opens exactly one receiver, peeks sequentially and closes the
//! receiver on every path once it was opened.

use crate::config::ServiceBusSettings;
use crate::error::{ConfigError, InspectorError, ProviderError};
use crate::filter::TimeRange;
use crate::message::{FullMessage, MessageSummary, SequenceNumber};
use crate::target::{QueueTargets, ReceiverTarget};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Number of messages requested per peek while listing
pub const DEFAULT_PEEK_BATCH_SIZE: u32 = 100;

// ============================================================================
// Queue Access Facade
// ============================================================================

/// Handle for non-destructive reads from one entity
#[async_trait]
pub trait MessageReceiver: Send {
    /// Peek up to `max_count` messages without locking or removing them.
    ///
    /// With `from_sequence` set, peeking starts at that sequence number.
    /// Without it, peeking continues from wherever the receiver's own cursor
    /// stands after the previous call. An empty result means there are no
    /// more messages at or after the cursor.
    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<FullMessage>, ProviderError>;

    /// Release the network and session resources held by the receiver
    async fn close(&mut self) -> Result<(), ProviderError>;
}

/// Opens receivers against a messaging backend.
///
/// Implementations must be safe to call from concurrent operations.
#[async_trait]
pub trait ReceiverFactory: Send + Sync {
    async fn open_receiver(
        &self,
        target: &ReceiverTarget,
    ) -> Result<Box<dyn MessageReceiver>, ProviderError>;

    /// Name of the backend, for logs
    fn provider_name(&self) -> &str;
}

/// Creates a [`ReceiverFactory`] from a connection string
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(
        &self,
        connection_string: &str,
    ) -> Result<Arc<dyn ReceiverFactory>, ProviderError>;
}

// ============================================================================
// Inspection Client
// ============================================================================

/// Which family of entities an operation reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Live,
    DeadLetter,
}

impl ReadKind {
    pub fn from_dead_letter_flag(dead_letter: bool) -> Self {
        if dead_letter {
            Self::DeadLetter
        } else {
            Self::Live
        }
    }

    fn is_dead_letter(self) -> bool {
        self == Self::DeadLetter
    }

    fn open_error(self, error: ProviderError) -> InspectorError {
        match self {
            Self::Live => InspectorError::OpenReceiver(error),
            Self::DeadLetter => InspectorError::OpenDeadLetterReceiver(error),
        }
    }

    fn receive_error(self, error: ProviderError) -> InspectorError {
        match self {
            Self::Live => InspectorError::Receive(error),
            Self::DeadLetter => InspectorError::DeadLetterReceive(error),
        }
    }
}

impl fmt::Display for ReadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::DeadLetter => write!(f, "dead-letter"),
        }
    }
}

/// Read-only view over a queue (or topic subscription) and its dead-letter
/// queue.
///
/// Holds no per-call state, so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct InspectorClient {
    factory: Arc<dyn ReceiverFactory>,
    targets: QueueTargets,
    batch_size: u32,
}

impl fmt::Debug for InspectorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectorClient")
            .field("provider", &self.factory.provider_name())
            .field("targets", &self.targets)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl InspectorClient {
    pub fn new(factory: Arc<dyn ReceiverFactory>, targets: QueueTargets) -> Self {
        Self {
            factory,
            targets,
            batch_size: DEFAULT_PEEK_BATCH_SIZE,
        }
    }

    /// Override the number of messages requested per peek. Zero is raised
    /// to one.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Build a client from settings, creating the backend through `connector`
    pub async fn connect(
        settings: &ServiceBusSettings,
        connector: &dyn BackendConnector,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let connection_string = settings.connection_string()?;

        let factory = connector
            .connect(connection_string)
            .await
            .map_err(ConfigError::Connect)?;

        let targets = settings.targets();
        info!(
            provider = factory.provider_name(),
            live = ?targets.live().ok().map(|t| t.entity_path()),
            dead_letter = ?targets.dead_letter().ok().map(|t| t.entity_path()),
            "Connected inspection client"
        );

        Ok(Self::new(factory, targets).with_batch_size(settings.peek_batch_size))
    }

    pub fn targets(&self) -> &QueueTargets {
        &self.targets
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn provider_name(&self) -> &str {
        self.factory.provider_name()
    }

    /// List live messages whose enqueue time falls within `range`
    pub async fn list_messages(
        &self,
        range: &TimeRange,
    ) -> Result<Vec<MessageSummary>, InspectorError> {
        self.list(ReadKind::Live, range).await
    }

    /// List dead-lettered messages whose enqueue time falls within `range`
    pub async fn list_dead_letters(
        &self,
        range: &TimeRange,
    ) -> Result<Vec<MessageSummary>, InspectorError> {
        self.list(ReadKind::DeadLetter, range).await
    }

    /// Scan an entity from its start, keeping the summaries that match
    /// `range` in the order the backend returned them.
    #[instrument(skip(self), fields(batch_size = self.batch_size))]
    pub async fn list(
        &self,
        kind: ReadKind,
        range: &TimeRange,
    ) -> Result<Vec<MessageSummary>, InspectorError> {
        let target = self.targets.select(kind.is_dead_letter())?;
        let mut receiver = self
            .factory
            .open_receiver(&target)
            .await
            .map_err(|e| kind.open_error(e))?;

        let result = self.collect_matches(receiver.as_mut(), kind, range).await;
        release(receiver.as_mut(), &target).await;

        if let Ok(matches) = &result {
            debug!(entity = %target, matched = matches.len(), "Listing complete");
        }
        result
    }

    async fn collect_matches(
        &self,
        receiver: &mut dyn MessageReceiver,
        kind: ReadKind,
        range: &TimeRange,
    ) -> Result<Vec<MessageSummary>, InspectorError> {
        let mut matches = Vec::new();
        loop {
            let batch = receiver
                .peek_messages(self.batch_size, None)
                .await
                .map_err(|e| kind.receive_error(e))?;

            // Only a literally empty batch ends the scan.
            if batch.is_empty() {
                break;
            }

            debug!(batch_len = batch.len(), "Peeked batch");
            matches.extend(
                batch
                    .iter()
                    .filter(|m| range.contains(m.enqueued_time))
                    .map(FullMessage::summary),
            );
        }
        Ok(matches)
    }

    /// Fetch the message at exactly `sequence` from the live or dead-letter
    /// entity. No range filtering is applied.
    #[instrument(skip(self))]
    pub async fn fetch_message(
        &self,
        sequence: SequenceNumber,
        dead_letter: bool,
    ) -> Result<FullMessage, InspectorError> {
        let target = self.targets.select(dead_letter)?;
        let mut receiver = self
            .factory
            .open_receiver(&target)
            .await
            .map_err(InspectorError::OpenReceiver)?;

        let peeked = receiver
            .peek_messages(1, Some(sequence))
            .await
            .map_err(InspectorError::Peek);
        release(receiver.as_mut(), &target).await;

        peeked?
            .into_iter()
            .next()
            .filter(|message| message.sequence_number == sequence)
            .ok_or(InspectorError::MessageNotFound { sequence })
    }
}

/// Close a receiver once the operation that opened it is done. A close
/// failure is logged and never replaces the operation's own outcome.
async fn release(receiver: &mut dyn MessageReceiver, target: &ReceiverTarget) {
    if let Err(e) = receiver.close().await {
        warn!(entity = %target, error = %e, "Failed to close receiver");
    }
}
