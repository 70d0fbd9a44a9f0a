//! Message snapshots returned by the lister and the fetcher.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a message within its entity, assigned by the service on enqueue
pub type SequenceNumber = i64;

/// Minimal metadata for one message produced by a list operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub sequence_number: SequenceNumber,
    pub enqueued_time: DateTime<Utc>,
}

impl MessageSummary {
    pub fn new(sequence_number: SequenceNumber, enqueued_time: DateTime<Utc>) -> Self {
        Self {
            sequence_number,
            enqueued_time,
        }
    }
}

/// Broker-owned properties carried alongside every message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProperties {
    #[serde(rename = "MessageID")]
    pub message_id: Option<String>,
    #[serde(rename = "ContentType")]
    pub content_type: Option<String>,
    #[serde(rename = "CorrelationID")]
    pub correlation_id: Option<String>,
    #[serde(rename = "Subject")]
    pub subject: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "ReplyTo")]
    pub reply_to: Option<String>,
    #[serde(rename = "ReplyToSession")]
    pub reply_to_session_id: Option<String>,
    #[serde(rename = "SessionID")]
    pub session_id: Option<String>,
}

/// Read-only snapshot of a single queue entry at peek time.
///
/// This is what a [`MessageReceiver`](crate::client::MessageReceiver) hands
/// back from a peek; the lister reduces it to a [`MessageSummary`] and the
/// fetcher returns it whole.
#[derive(Debug, Clone, PartialEq)]
pub struct FullMessage {
    pub sequence_number: SequenceNumber,
    pub enqueued_time: DateTime<Utc>,
    pub body: Bytes,
    pub application_properties: BTreeMap<String, serde_json::Value>,
    pub system_properties: SystemProperties,
}

impl FullMessage {
    /// Create a message with an empty body and no properties
    pub fn new(sequence_number: SequenceNumber, enqueued_time: DateTime<Utc>) -> Self {
        Self {
            sequence_number,
            enqueued_time,
            body: Bytes::new(),
            application_properties: BTreeMap::new(),
            system_properties: SystemProperties::default(),
        }
    }

    /// Set the raw body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a user-defined application property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.application_properties.insert(key.into(), value.into());
        self
    }

    /// Replace the system properties
    pub fn with_system_properties(mut self, system_properties: SystemProperties) -> Self {
        self.system_properties = system_properties;
        self
    }

    pub fn summary(&self) -> MessageSummary {
        MessageSummary::new(self.sequence_number, self.enqueued_time)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Convert into the payload handed to tool and HTTP callers
    pub fn to_details(&self) -> MessageDetails {
        MessageDetails {
            sequence_number: self.sequence_number,
            enqueued_time: self
                .enqueued_time
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            body: self.body_text(),
            properties: self.application_properties.clone(),
            system_properties: self.system_properties.clone(),
        }
    }
}

/// Serializable view of a fetched message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetails {
    pub sequence_number: SequenceNumber,
    /// RFC3339, UTC
    pub enqueued_time: String,
    pub body: String,
    pub properties: BTreeMap<String, serde_json::Value>,
    pub system_properties: SystemProperties,
}

impl From<&FullMessage> for MessageDetails {
    fn from(message: &FullMessage) -> Self {
        message.to_details()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
