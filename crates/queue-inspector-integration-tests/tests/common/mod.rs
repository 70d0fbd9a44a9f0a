//! Common test utilities for queue-inspector integration tests
//!
//! Builds an in-memory namespace shaped like a small deployment:
//!
//! - queue `orders`: seq 1 @ T-1h, seq 2 @ T, seq 3 @ T+1h
//! - `orders/$DeadLetterQueue`: seq 1 @ T-30m
//! - subscription `events/audit`: seq 1 @ T
//! - `events/Subscriptions/audit/$DeadLetterQueue`: empty

use chrono::{DateTime, Duration, TimeZone, Utc};
use queue_inspector_core::{
    FullMessage, InMemoryServiceBus, InspectorClient, QueueTargets, ReceiverTarget,
    SystemProperties,
};
use std::sync::Arc;

/// Reference time all fixtures are relative to
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn orders() -> ReceiverTarget {
    ReceiverTarget::queue("orders")
}

pub fn orders_dead_letter() -> ReceiverTarget {
    ReceiverTarget::queue("orders/$DeadLetterQueue")
}

pub fn audit_subscription() -> ReceiverTarget {
    ReceiverTarget::subscription("events", "audit")
}

pub fn seeded_bus() -> InMemoryServiceBus {
    let t = reference_time();
    let bus = InMemoryServiceBus::new();

    bus.enqueue(
        &orders(),
        FullMessage::new(0, t - Duration::hours(1)).with_body(r#"{"order":1}"#),
    );
    bus.enqueue(
        &orders(),
        FullMessage::new(0, t)
            .with_body(r#"{"order":2}"#)
            .with_property("priority", "high")
            .with_property("attempt", 1)
            .with_system_properties(SystemProperties {
                message_id: Some("msg-2".to_string()),
                content_type: Some("application/json".to_string()),
                correlation_id: Some("corr-2".to_string()),
                subject: Some("order.created".to_string()),
                session_id: Some("customer-9".to_string()),
                ..Default::default()
            }),
    );
    bus.enqueue(
        &orders(),
        FullMessage::new(0, t + Duration::hours(1)).with_body(r#"{"order":3}"#),
    );

    bus.enqueue(
        &orders_dead_letter(),
        FullMessage::new(0, t - Duration::minutes(30)).with_body("poison"),
    );

    bus.enqueue(
        &audit_subscription(),
        FullMessage::new(0, t).with_body("audit entry"),
    );
    bus.create_entity(&ReceiverTarget::queue(
        "events/Subscriptions/audit/$DeadLetterQueue",
    ));

    bus
}

pub fn client_for(bus: &InMemoryServiceBus, targets: QueueTargets) -> Arc<InspectorClient> {
    Arc::new(InspectorClient::new(Arc::new(bus.clone()), targets))
}

#[allow(dead_code)]
pub fn orders_client(bus: &InMemoryServiceBus) -> Arc<InspectorClient> {
    client_for(bus, QueueTargets::for_queue("orders"))
}
