//! Tool argument types and the logic behind each tool.
//!
//! Every tool produces either JSON text or a [`ToolError`] whose message is
//! returned to the agent as an error result.

use queue_inspector_core::{InspectorClient, InspectorError, RangeError, SequenceNumber, TimeRange};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;

/// Arguments of `ListMessages` and `ListDeadLetters`.
///
/// Values arrive untyped from the agent. A bound that is not a string is
/// treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListParams {
    /// RFC3339 start time
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub from: Option<Value>,

    /// RFC3339 end time
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub to: Option<Value>,
}

/// Arguments of `PrintMessage`.
///
/// Both fields are required by the schema but type-checked by the tool, so
/// a wrong type comes back as a tool error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrintMessageParams {
    /// The sequence number of the message
    #[schemars(with = "f64")]
    pub sequence_number: Option<Value>,

    /// Set to true to fetch from the dead-letter queue
    #[schemars(with = "bool")]
    pub dead_letter: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error("`sequenceNumber` must be a number")]
    SequenceNotNumber,

    #[error("`sequenceNumber` must be an integer, got {value}")]
    InvalidSequence { value: f64 },

    #[error("`deadLetter` must be a boolean")]
    DeadLetterNotBoolean,

    #[error("{context}: {source}")]
    Inspect {
        context: &'static str,
        #[source]
        source: InspectorError,
    },

    #[error("{context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ToolError {
    fn inspect(context: &'static str) -> impl FnOnce(InspectorError) -> Self {
        move |source| Self::Inspect { context, source }
    }

    fn serialize(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Serialize { context, source }
    }
}

impl ListParams {
    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: from.map(Value::from),
            to: to.map(Value::from),
        }
    }

    pub fn time_range(&self) -> Result<TimeRange, RangeError> {
        TimeRange::parse(as_text(&self.from), as_text(&self.to))
    }
}

fn as_text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

impl PrintMessageParams {
    pub fn new(sequence_number: f64, dead_letter: bool) -> Self {
        Self {
            sequence_number: Some(Value::from(sequence_number)),
            dead_letter: Some(Value::Bool(dead_letter)),
        }
    }

    /// The requested sequence number, which must be a whole number
    pub fn sequence(&self) -> Result<SequenceNumber, ToolError> {
        let value = self
            .sequence_number
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or(ToolError::SequenceNotNumber)?;
        let in_range = value >= SequenceNumber::MIN as f64 && value <= SequenceNumber::MAX as f64;
        if !value.is_finite() || value.fract() != 0.0 || !in_range {
            return Err(ToolError::InvalidSequence { value });
        }
        Ok(value as SequenceNumber)
    }

    pub fn dead_letter(&self) -> Result<bool, ToolError> {
        self.dead_letter
            .as_ref()
            .and_then(Value::as_bool)
            .ok_or(ToolError::DeadLetterNotBoolean)
    }
}

#[instrument(skip(client))]
pub async fn list_messages(client: &InspectorClient, params: &ListParams) -> Result<String, ToolError> {
    let range = params.time_range()?;
    let messages = client
        .list_messages(&range)
        .await
        .map_err(ToolError::inspect("failed to list messages"))?;
    serde_json::to_string(&messages).map_err(ToolError::serialize("failed to marshal messages"))
}

#[instrument(skip(client))]
pub async fn list_dead_letters(
    client: &InspectorClient,
    params: &ListParams,
) -> Result<String, ToolError> {
    let range = params.time_range()?;
    let messages = client
        .list_dead_letters(&range)
        .await
        .map_err(ToolError::inspect("failed to list dead-letter messages"))?;
    serde_json::to_string(&messages)
        .map_err(ToolError::serialize("failed to marshal dead-letter messages"))
}

#[instrument(skip(client))]
pub async fn print_message(
    client: &InspectorClient,
    params: &PrintMessageParams,
) -> Result<String, ToolError> {
    let sequence = params.sequence()?;
    let dead_letter = params.dead_letter()?;
    let message = client
        .fetch_message(sequence, dead_letter)
        .await
        .map_err(ToolError::inspect("failed to fetch message"))?;
    serde_json::to_string(&message.to_details())
        .map_err(ToolError::serialize("failed to marshal message"))
}
