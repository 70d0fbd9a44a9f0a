//! Error types for inspection operations.

use crate::message::SequenceNumber;
use thiserror::Error;

/// Failure reported by a messaging backend while opening, peeking or closing
/// a receiver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("entity not found: {entity}")]
    EntityNotFound { entity: String },

    #[error("receiver is closed")]
    ReceiverClosed,

    #[error("{provider} error ({code}): {message}")]
    Provider {
        provider: String,
        code: String,
        message: String,
    },
}

impl ProviderError {
    /// Check if the failure is likely to go away on its own
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } => true,
            Self::AuthenticationFailed { .. } => false,
            Self::EntityNotFound { .. } => false,
            Self::ReceiverClosed => false,
            Self::Provider { .. } => true,
        }
    }
}

/// Errors returned by the message lister and the single message fetcher.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("no queue or topic/subscription configured")]
    NoQueueConfigured,

    #[error("no DLQ configured")]
    NoDeadLetterConfigured,

    #[error("error creating receiver: {0}")]
    OpenReceiver(#[source] ProviderError),

    #[error("error creating DLQ receiver: {0}")]
    OpenDeadLetterReceiver(#[source] ProviderError),

    #[error("receive error: {0}")]
    Receive(#[source] ProviderError),

    #[error("DLQ receive error: {0}")]
    DeadLetterReceive(#[source] ProviderError),

    #[error("peek error: {0}")]
    Peek(#[source] ProviderError),

    #[error("message {sequence} not found")]
    MessageNotFound { sequence: SequenceNumber },
}

impl InspectorError {
    /// True when the requested sequence number does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MessageNotFound { .. })
    }

    /// True when the operation failed because no target is configured
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NoQueueConfigured | Self::NoDeadLetterConfigured)
    }

    /// The backend failure behind this error, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::OpenReceiver(e)
            | Self::OpenDeadLetterReceiver(e)
            | Self::Receive(e)
            | Self::DeadLetterReceive(e)
            | Self::Peek(e) => Some(e),
            _ => None,
        }
    }
}

/// Configuration loading and client construction errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config: {0}")]
    Read(#[from] config::ConfigError),

    #[error("serviceBus.connectionString is required")]
    MissingConnectionString,

    #[error("serviceBus.peekBatchSize must be greater than zero")]
    InvalidBatchSize,

    #[error("serviceBus.queueName or serviceBus.topicName with serviceBus.subscriptionName is required")]
    MissingTarget,

    #[error("failed to create Azure Service Bus client: {0}")]
    Connect(#[source] ProviderError),
}

/// Errors produced while parsing the bounds of a time range
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("invalid `{bound}` datetime: {source}")]
    InvalidBound {
        bound: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
