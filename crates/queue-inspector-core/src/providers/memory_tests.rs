//! Tests for the in-memory backend.

use super::*;
use crate::client::InspectorClient;
use crate::filter::TimeRange;
use crate::target::QueueTargets;
use chrono::{Duration, TimeZone};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn orders() -> ReceiverTarget {
    ReceiverTarget::queue("orders")
}

#[test]
fn test_enqueue_assigns_sequence_per_entity() {
    let bus = InMemoryServiceBus::new();
    let dlq = ReceiverTarget::queue("orders/$DeadLetterQueue");

    assert_eq!(bus.enqueue_at(&orders(), base_time()), 1);
    assert_eq!(bus.enqueue_at(&orders(), base_time()), 2);
    assert_eq!(bus.enqueue_at(&dlq, base_time()), 1);

    assert_eq!(bus.message_count(&orders()), 2);
    assert_eq!(bus.message_count(&dlq), 1);
}

#[tokio::test]
async fn test_open_unknown_entity_fails() {
    let bus = InMemoryServiceBus::new();

    let result = bus.open_receiver(&orders()).await;

    assert!(matches!(
        result,
        Err(ProviderError::EntityNotFound { entity }) if entity == "orders"
    ));
    assert_eq!(bus.open_receivers(), 0);
}

#[tokio::test]
async fn test_created_entity_can_be_opened_empty() {
    let bus = InMemoryServiceBus::new();
    bus.create_entity(&orders());

    let mut receiver = bus.open_receiver(&orders()).await.unwrap();

    assert!(receiver.peek_messages(10, None).await.unwrap().is_empty());
    receiver.close().await.unwrap();
}

#[tokio::test]
async fn test_subscription_entities_are_addressed_by_path() {
    let bus = InMemoryServiceBus::new();
    let subscription = ReceiverTarget::subscription("events", "audit");
    bus.enqueue_at(&subscription, base_time());

    let mut receiver = bus
        .open_receiver(&ReceiverTarget::queue("events/Subscriptions/audit"))
        .await
        .unwrap();

    assert_eq!(receiver.peek_messages(10, None).await.unwrap().len(), 1);
    receiver.close().await.unwrap();
}

#[tokio::test]
async fn test_peek_advances_cursor_without_removing() {
    let bus = InMemoryServiceBus::new();
    for _ in 0..5 {
        bus.enqueue_at(&orders(), base_time());
    }

    let mut receiver = bus.open_receiver(&orders()).await.unwrap();
    let first = receiver.peek_messages(2, None).await.unwrap();
    let second = receiver.peek_messages(2, None).await.unwrap();
    let third = receiver.peek_messages(2, None).await.unwrap();
    let fourth = receiver.peek_messages(2, None).await.unwrap();
    receiver.close().await.unwrap();

    let seqs = |batch: &[FullMessage]| batch.iter().map(|m| m.sequence_number).collect::<Vec<_>>();
    assert_eq!(seqs(&first), vec![1, 2]);
    assert_eq!(seqs(&second), vec![3, 4]);
    assert_eq!(seqs(&third), vec![5]);
    assert!(fourth.is_empty());
    assert_eq!(bus.message_count(&orders()), 5);
}

#[tokio::test]
async fn test_explicit_sequence_overrides_cursor() {
    let bus = InMemoryServiceBus::new();
    for _ in 0..4 {
        bus.enqueue_at(&orders(), base_time());
    }

    let mut receiver = bus.open_receiver(&orders()).await.unwrap();
    let at_three = receiver.peek_messages(1, Some(3)).await.unwrap();
    let past_end = receiver.peek_messages(1, Some(10)).await.unwrap();
    receiver.close().await.unwrap();

    assert_eq!(at_three[0].sequence_number, 3);
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_closed_receiver_rejects_peek() {
    let bus = InMemoryServiceBus::new();
    bus.create_entity(&orders());

    let mut receiver = bus.open_receiver(&orders()).await.unwrap();
    assert_eq!(bus.open_receivers(), 1);
    receiver.close().await.unwrap();
    receiver.close().await.unwrap();

    assert_eq!(bus.open_receivers(), 0);
    assert_eq!(
        receiver.peek_messages(1, None).await.unwrap_err(),
        ProviderError::ReceiverClosed
    );
}

#[tokio::test]
async fn test_injected_faults() {
    let bus = InMemoryServiceBus::new();
    bus.create_entity(&orders());
    let fault = ProviderError::ConnectionFailed {
        message: "injected".to_string(),
    };

    bus.fail_open_with(fault.clone());
    assert_eq!(bus.open_receiver(&orders()).await.err(), Some(fault.clone()));

    bus.clear_faults();
    bus.fail_peek_with(fault.clone());
    let mut receiver = bus.open_receiver(&orders()).await.unwrap();
    assert_eq!(receiver.peek_messages(1, None).await.unwrap_err(), fault);

    bus.fail_close_with(fault.clone());
    assert_eq!(receiver.close().await.unwrap_err(), fault);
    assert_eq!(bus.open_receivers(), 0);
}

#[tokio::test]
async fn test_client_scan_over_memory_bus() {
    let bus = InMemoryServiceBus::new();
    let t = base_time();
    bus.enqueue_at(&orders(), t - Duration::hours(1));
    bus.enqueue_at(&orders(), t);
    for i in 0..250 {
        bus.enqueue_at(&orders(), t + Duration::minutes(i));
    }

    let client = InspectorClient::new(Arc::new(bus.clone()), QueueTargets::for_queue("orders"));
    let range = TimeRange::new(Some(t - Duration::minutes(30)), Some(t));

    let result = client.list_messages(&range).await.unwrap();

    let seqs: Vec<_> = result.iter().map(|m| m.sequence_number).collect();
    assert_eq!(seqs, vec![2, 3]);
    assert_eq!(bus.open_receivers(), 0);
}

#[tokio::test]
async fn test_client_releases_receiver_when_peek_fails() {
    let bus = InMemoryServiceBus::new();
    bus.enqueue_at(&orders(), base_time());
    bus.fail_peek_with(ProviderError::ReceiverClosed);

    let client = InspectorClient::new(Arc::new(bus.clone()), QueueTargets::for_queue("orders"));

    assert!(client.list_messages(&TimeRange::unbounded()).await.is_err());
    assert!(client.fetch_message(1, false).await.is_err());
    assert_eq!(bus.open_receivers(), 0);
}

#[test]
fn test_provider_name() {
    assert_eq!(InMemoryServiceBus::new().provider_name(), "InMemory");
}
