//! Resolution of the entities a client reads from.
//!
//! A client reads live messages from either a queue or a topic subscription,
//! and dead-lettered messages from the dead-letter sub-queue of whichever of
//! those is configured. Dead-letter entities are addressed by path:
//!
//! ```text
//! <queue>/$DeadLetterQueue
//! <topic>/Subscriptions/<subscription>/$DeadLetterQueue
//! ```

use crate::error::InspectorError;
use serde::Serialize;
use std::fmt;

/// Suffix addressing the dead-letter sub-queue of an entity
pub const DEAD_LETTER_SUFFIX: &str = "$DeadLetterQueue";

/// Something a receiver can be opened against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReceiverTarget {
    /// A queue, or any entity addressed by path (such as a dead-letter queue)
    Queue { name: String },
    /// A subscription of a topic
    Subscription { topic: String, subscription: String },
}

impl ReceiverTarget {
    pub fn queue(name: impl Into<String>) -> Self {
        Self::Queue { name: name.into() }
    }

    pub fn subscription(topic: impl Into<String>, subscription: impl Into<String>) -> Self {
        Self::Subscription {
            topic: topic.into(),
            subscription: subscription.into(),
        }
    }

    /// Entity path as understood by the service
    pub fn entity_path(&self) -> String {
        match self {
            Self::Queue { name } => name.clone(),
            Self::Subscription {
                topic,
                subscription,
            } => subscription_path(topic, subscription),
        }
    }
}

impl fmt::Display for ReceiverTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entity_path())
    }
}

/// Path of a topic subscription
pub fn subscription_path(topic: &str, subscription: &str) -> String {
    format!("{}/Subscriptions/{}", topic, subscription)
}

/// Dead-letter path for a queue
pub fn queue_dead_letter_path(queue: &str) -> String {
    format!("{}/{}", queue, DEAD_LETTER_SUFFIX)
}

/// Dead-letter path for a topic subscription
pub fn subscription_dead_letter_path(topic: &str, subscription: &str) -> String {
    format!("{}/{}", subscription_path(topic, subscription), DEAD_LETTER_SUFFIX)
}

/// The resolved set of entities a client may read.
///
/// Built once from configuration and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTargets {
    pub queue_name: Option<String>,
    pub topic_name: Option<String>,
    pub subscription_name: Option<String>,
    pub dead_letter_queue: Option<String>,
    pub dead_letter_subscription: Option<String>,
}

impl QueueTargets {
    /// Resolve targets from the configured names, deriving the dead-letter
    /// paths. Empty names count as unset.
    pub fn resolve(queue: Option<&str>, topic: Option<&str>, subscription: Option<&str>) -> Self {
        let queue_name = non_empty(queue);
        let topic_name = non_empty(topic);
        let subscription_name = non_empty(subscription);

        let dead_letter_queue = queue_name.as_deref().map(queue_dead_letter_path);
        let dead_letter_subscription = match (&topic_name, &subscription_name) {
            (Some(topic), Some(sub)) => Some(subscription_dead_letter_path(topic, sub)),
            _ => None,
        };

        Self {
            queue_name,
            topic_name,
            subscription_name,
            dead_letter_queue,
            dead_letter_subscription,
        }
    }

    /// Targets for a single queue
    pub fn for_queue(queue: &str) -> Self {
        Self::resolve(Some(queue), None, None)
    }

    /// Targets for a single topic subscription
    pub fn for_subscription(topic: &str, subscription: &str) -> Self {
        Self::resolve(None, Some(topic), Some(subscription))
    }

    /// Target for live reads. The queue takes precedence over a topic
    /// subscription when both are configured.
    pub fn live(&self) -> Result<ReceiverTarget, InspectorError> {
        if let Some(queue) = &self.queue_name {
            return Ok(ReceiverTarget::queue(queue.clone()));
        }
        match (&self.topic_name, &self.subscription_name) {
            (Some(topic), Some(sub)) => Ok(ReceiverTarget::subscription(topic.clone(), sub.clone())),
            _ => Err(InspectorError::NoQueueConfigured),
        }
    }

    /// Target for dead-letter reads, always opened by path
    pub fn dead_letter(&self) -> Result<ReceiverTarget, InspectorError> {
        self.dead_letter_queue
            .as_ref()
            .or(self.dead_letter_subscription.as_ref())
            .map(|path| ReceiverTarget::queue(path.clone()))
            .ok_or(InspectorError::NoDeadLetterConfigured)
    }

    /// Target for either kind of read
    pub fn select(&self, dead_letter: bool) -> Result<ReceiverTarget, InspectorError> {
        if dead_letter {
            self.dead_letter()
        } else {
            self.live()
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
