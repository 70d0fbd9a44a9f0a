//! In-memory messaging backend for testing and development.
//!
//! Entities are addressed by the same paths the service uses, so a queue
//! `orders` and its dead-letter queue `orders/$DeadLetterQueue` are two
//! independent entities here. Each entity assigns increasing sequence numbers
//! starting at 1. Receivers peek without removing anything and keep their
//! own cursor between calls.

use crate::client::{MessageReceiver, ReceiverFactory};
use crate::error::ProviderError;
use crate::message::{FullMessage, SequenceNumber};
use crate::target::ReceiverTarget;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// Provider name reported in logs
pub const IN_MEMORY_PROVIDER: &str = "InMemory";

// ============================================================================
// Internal Storage Structures
// ============================================================================

#[derive(Default)]
struct EntityStore {
    /// Messages ordered by sequence number
    messages: BTreeMap<SequenceNumber, FullMessage>,
    last_sequence: SequenceNumber,
}

impl EntityStore {
    fn enqueue(&mut self, mut message: FullMessage) -> SequenceNumber {
        self.last_sequence += 1;
        message.sequence_number = self.last_sequence;
        self.messages.insert(self.last_sequence, message);
        self.last_sequence
    }

    fn peek(&self, from: SequenceNumber, max_count: usize) -> Vec<FullMessage> {
        self.messages
            .range(from..)
            .take(max_count)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

/// Failures the backend should report, for exercising error paths
#[derive(Debug, Default, Clone)]
struct FaultPlan {
    open: Option<ProviderError>,
    peek: Option<ProviderError>,
    close: Option<ProviderError>,
}

#[derive(Default)]
struct BusState {
    entities: HashMap<String, EntityStore>,
    faults: FaultPlan,
}

// ============================================================================
// In-Memory Service Bus
// ============================================================================

/// Thread-safe in-process stand-in for a Service Bus namespace
#[derive(Clone, Default)]
pub struct InMemoryServiceBus {
    state: Arc<RwLock<BusState>>,
    open_receivers: Arc<AtomicUsize>,
}

impl InMemoryServiceBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entity so that opening a receiver on it succeeds
    pub fn create_entity(&self, target: &ReceiverTarget) {
        let mut state = self.write_state();
        state.entities.entry(target.entity_path()).or_default();
    }

    /// Append a message to an entity, creating the entity if needed. The
    /// message's sequence number is replaced with the next one for the
    /// entity and returned.
    pub fn enqueue(&self, target: &ReceiverTarget, message: FullMessage) -> SequenceNumber {
        let mut state = self.write_state();
        state
            .entities
            .entry(target.entity_path())
            .or_default()
            .enqueue(message)
    }

    /// Append a message with an empty body enqueued at `enqueued_time`
    pub fn enqueue_at(&self, target: &ReceiverTarget, enqueued_time: DateTime<Utc>) -> SequenceNumber {
        self.enqueue(target, FullMessage::new(0, enqueued_time))
    }

    /// Number of messages held by an entity
    pub fn message_count(&self, target: &ReceiverTarget) -> usize {
        self.read_state()
            .entities
            .get(&target.entity_path())
            .map_or(0, |e| e.messages.len())
    }

    /// Receivers opened and not yet closed
    pub fn open_receivers(&self) -> usize {
        self.open_receivers.load(Ordering::SeqCst)
    }

    /// Make every subsequent open fail with `error`
    pub fn fail_open_with(&self, error: ProviderError) {
        self.write_state().faults.open = Some(error);
    }

    /// Make every subsequent peek fail with `error`
    pub fn fail_peek_with(&self, error: ProviderError) {
        self.write_state().faults.peek = Some(error);
    }

    /// Make every subsequent close fail with `error`
    pub fn fail_close_with(&self, error: ProviderError) {
        self.write_state().faults.close = Some(error);
    }

    /// Remove all injected failures
    pub fn clear_faults(&self) {
        self.write_state().faults = FaultPlan::default();
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BusState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BusState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReceiverFactory for InMemoryServiceBus {
    async fn open_receiver(
        &self,
        target: &ReceiverTarget,
    ) -> Result<Box<dyn MessageReceiver>, ProviderError> {
        let entity = target.entity_path();
        {
            let state = self.read_state();
            if let Some(error) = &state.faults.open {
                return Err(error.clone());
            }
            if !state.entities.contains_key(&entity) {
                return Err(ProviderError::EntityNotFound { entity });
            }
        }

        self.open_receivers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryReceiver {
            bus: self.clone(),
            entity,
            cursor: 1,
            closed: false,
        }))
    }

    fn provider_name(&self) -> &str {
        IN_MEMORY_PROVIDER
    }
}

// ============================================================================
// In-Memory Receiver
// ============================================================================

/// Peek-only receiver over one in-memory entity
pub struct InMemoryReceiver {
    bus: InMemoryServiceBus,
    entity: String,
    /// Next sequence number to peek when the caller gives none
    cursor: SequenceNumber,
    closed: bool,
}

#[async_trait]
impl MessageReceiver for InMemoryReceiver {
    async fn peek_messages(
        &mut self,
        max_count: u32,
        from_sequence: Option<SequenceNumber>,
    ) -> Result<Vec<FullMessage>, ProviderError> {
        if self.closed {
            return Err(ProviderError::ReceiverClosed);
        }

        let state = self.bus.read_state();
        if let Some(error) = &state.faults.peek {
            return Err(error.clone());
        }

        let from = from_sequence.unwrap_or(self.cursor);
        let batch = state
            .entities
            .get(&self.entity)
            .map(|e| e.peek(from, max_count as usize))
            .unwrap_or_default();

        if let Some(last) = batch.last() {
            self.cursor = last.sequence_number + 1;
        }
        Ok(batch)
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.bus.open_receivers.fetch_sub(1, Ordering::SeqCst);

        match &self.bus.read_state().faults.close {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
