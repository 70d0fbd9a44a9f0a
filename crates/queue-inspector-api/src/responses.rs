//! Query and response types for the HTTP surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query string of `/messages` and `/deadletters`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Query string of `/message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    pub seq: Option<String>,
    pub deadletter: Option<String>,
}

impl MessageQuery {
    /// Only the literal `true` selects the dead-letter queue
    pub fn dead_letter(&self) -> bool {
        self.deadletter.as_deref() == Some("true")
    }
}

/// Body of `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    #[serde(rename = "liveEntity")]
    pub live_entity: Option<String>,
    #[serde(rename = "deadLetterEntity")]
    pub dead_letter_entity: Option<String>,
    pub timestamp: DateTime<Utc>,
}
