//! Azure Service Bus backend built on the `azservicebus` AMQP client.
//!
//! Peeking is a management operation on the AMQP link, so it never locks or
//! settles messages. Dead-letter entities are opened as queues by path
//! (`orders/$DeadLetterQueue`, `events/Subscriptions/audit/$DeadLetterQueue`).

use crate::client::{BackendConnector, MessageReceiver, ReceiverFactory};
use crate::error::ProviderError;
use crate::message::{FullMessage, SequenceNumber, SystemProperties};
use crate::target::ReceiverTarget;
use async_trait::async_trait;
use azservicebus::core::BasicRetryPolicy;
use azservicebus::{
    ServiceBusClient, ServiceBusClientOptions, ServiceBusPeekedMessage, ServiceBusReceiver,
    ServiceBusReceiverOptions,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "azure_tests.rs"]
mod tests;

/// Provider name reported in logs and errors
pub const AZURE_PROVIDER: &str = "AzureServiceBus";

fn sdk_error(code: &str, error: impl std::fmt::Display) -> ProviderError {
    ProviderError::Provider {
        provider: AZURE_PROVIDER.to_string(),
        code: code.to_string(),
        message: error.to_string(),
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Creates [`AzureServiceBusFactory`] instances from connection strings
#[derive(Debug, Default, Clone, Copy)]
pub struct AzureServiceBusConnector;

#[async_trait]
impl BackendConnector for AzureServiceBusConnector {
    async fn connect(
        &self,
        connection_string: &str,
    ) -> Result<Arc<dyn ReceiverFactory>, ProviderError> {
        let client = ServiceBusClient::new_from_connection_string(
            connection_string,
            ServiceBusClientOptions::default(),
        )
        .await
        .map_err(|e| ProviderError::ConnectionFailed {
            message: e.to_string(),
        })?;

        Ok(Arc::new(AzureServiceBusFactory {
            client: Mutex::new(client),
        }))
    }
}

// ============================================================================
// Receiver Factory
// ============================================================================

/// Opens peek receivers on one Service Bus namespace
pub struct AzureServiceBusFactory {
    // Receiver creation needs exclusive access to the client.
    client: Mutex<ServiceBusClient<BasicRetryPolicy>>,
}

#[async_trait]
impl ReceiverFactory for AzureServiceBusFactory {
    async fn open_receiver(
        &self,
        target: &ReceiverTarget,
    ) -> Result<Box<dyn MessageReceiver>, ProviderError> {
        let mut client = self.client.lock().await;
        let receiver = match target {
            ReceiverTarget::Queue { name } => {
                client
                    .create_receiver_for_queue(name, ServiceBusReceiverOptions::default())
                    .await
            }
            ReceiverTarget::Subscription {
                topic,
                subscription,
            } => {
                client
                    .create_receiver_for_subscription(
                        topic,
                        subscription,
                        ServiceBusReceiverOptions::default(),
                    )
                    .await
            }
        }
        .map_err(|e| sdk_error("CreateReceiver", e))?;

        debug!(entity = %target, "Opened Service Bus receiver");
        Ok(Box::new(AzureReceiver {
            receiver: Some(receiver),
            next_sequence: None,
        }))
    }

    fn provider_name(&self) -> &str {
        AZURE_PROVIDER
    }
}

// ============================================================================
// Receiver
// ============================================================================

/// Peek receiver that threads its own cursor between calls.
struct AzureReceiver {
    receiver: Option<ServiceBusReceiver>,
    /// Sequence after the last one peeked; `None` before the first peek
    next_sequence: Option<SequenceNumber>,
}

#[async_trait]
impl MessageReceiver for AzureReceiver {
    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<FullMessage>, ProviderError> {
        let receiver = self.receiver.as_mut().ok_or(ProviderError::ReceiverClosed)?;
        let from = from_sequence.or(self.next_sequence);

        let peeked = receiver
            .peek_messages(max_count, from)
            .await
            .map_err(|e| sdk_error("PeekMessages", e))?;

        let messages: Vec<FullMessage> = peeked.iter().map(convert_peeked).collect();
        if let Some(last) = messages.last() {
            self.next_sequence = Some(last.sequence_number + 1);
        }
        Ok(messages)
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        match self.receiver.take() {
            Some(receiver) => receiver
                .dispose()
                .await
                .map_err(|e| sdk_error("Dispose", e)),
            None => Ok(()),
        }
    }
}

impl Drop for AzureReceiver {
    fn drop(&mut self) {
        if self.receiver.is_some() {
            warn!("Service Bus receiver dropped without being closed");
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

fn convert_peeked(message: &ServiceBusPeekedMessage) -> FullMessage {
    let enqueued = message.enqueued_time();
    let enqueued_time = DateTime::<Utc>::from_timestamp(enqueued.unix_timestamp(), enqueued.nanosecond())
        .unwrap_or_default();

    let body = message.body().map(|b| b.to_vec()).unwrap_or_default();

    let mut application_properties = BTreeMap::new();
    if let Some(props) = message.application_properties() {
        for (key, value) in props.0.iter() {
            application_properties.insert(key.to_string(), amqp_to_json(value));
        }
    }

    FullMessage {
        sequence_number: message.sequence_number(),
        enqueued_time,
        body: body.into(),
        application_properties,
        system_properties: SystemProperties {
            message_id: message.message_id().map(|v| v.to_string()),
            content_type: message.content_type().map(|v| v.to_string()),
            correlation_id: message.correlation_id().map(|v| v.to_string()),
            subject: message.subject().map(|v| v.to_string()),
            to: message.to().map(|v| v.to_string()),
            reply_to: message.reply_to().map(|v| v.to_string()),
            reply_to_session_id: message.reply_to_session_id().map(|v| v.to_string()),
            session_id: message.session_id().map(|v| v.to_string()),
        },
    }
}

fn amqp_to_json<V>(value: &V) -> serde_json::Value
where
    V: serde::Serialize + std::fmt::Debug,
{
    serde_json::to_value(value).unwrap_or_else(|_| serde_json::Value::String(format!("{:?}", value)))
}
