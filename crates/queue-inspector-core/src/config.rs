//! Configuration file loading.
//!
//! The file is read with the `config` crate; its format follows the file
//! extension (YAML, TOML or JSON).
//!
//! ```yaml
//! serviceBus:
//!   connectionString: "Endpoint=sb://example.servicebus.windows.net/;..."
//!   queueName: "orders"
//!   # or, for a topic subscription:
//!   # topicName: "events"
//!   # subscriptionName: "audit"
//!   peekBatchSize: 100
//! server:
//!   host: "0.0.0.0"
//!   port: 8080
//! ```

use crate::client::DEFAULT_PEEK_BATCH_SIZE;
use crate::error::ConfigError;
use crate::target::QueueTargets;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorSettings {
    #[serde(default, alias = "servicebus")]
    pub service_bus: ServiceBusSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

impl InspectorSettings {
    /// Load settings from `path`, apply a connection string override and
    /// validate the result
    pub fn load(
        path: impl AsRef<Path>,
        connection_string: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::read(path)?;
        settings
            .service_bus
            .override_connection_string(connection_string);
        settings.service_bus.validate()?;
        Ok(settings)
    }

    /// Load settings from `path` without validating them
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading configuration");

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .build()?
            .try_deserialize::<Self>()?;

        Ok(settings)
    }
}

/// Service Bus connection and entity names
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBusSettings {
    #[serde(default, alias = "connectionstring")]
    pub connection_string: String,

    #[serde(default, alias = "queuename")]
    pub queue_name: Option<String>,

    #[serde(default, alias = "topicname")]
    pub topic_name: Option<String>,

    #[serde(default, alias = "subscriptionname")]
    pub subscription_name: Option<String>,

    #[serde(default = "default_peek_batch_size", alias = "peekbatchsize")]
    pub peek_batch_size: u32,
}

impl Default for ServiceBusSettings {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            queue_name: None,
            topic_name: None,
            subscription_name: None,
            peek_batch_size: DEFAULT_PEEK_BATCH_SIZE,
        }
    }
}

// The connection string carries a shared access key.
impl std::fmt::Debug for ServiceBusSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBusSettings")
            .field("connection_string", &"<REDACTED>")
            .field("queue_name", &self.queue_name)
            .field("topic_name", &self.topic_name)
            .field("subscription_name", &self.subscription_name)
            .field("peek_batch_size", &self.peek_batch_size)
            .finish()
    }
}

impl ServiceBusSettings {
    /// The connection string, or an error when it is blank
    pub fn connection_string(&self) -> Result<&str, ConfigError> {
        let value = self.connection_string.trim();
        if value.is_empty() {
            return Err(ConfigError::MissingConnectionString);
        }
        Ok(value)
    }

    /// Replace the connection string when `value` is present
    pub fn override_connection_string(&mut self, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.connection_string = value;
        }
    }

    /// Reject a blank connection string or a zero batch size
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection_string()?;
        if self.peek_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }

    /// Resolve live and dead-letter targets from the configured names
    pub fn targets(&self) -> QueueTargets {
        QueueTargets::resolve(
            self.queue_name.as_deref(),
            self.topic_name.as_deref(),
            self.subscription_name.as_deref(),
        )
    }
}

fn default_peek_batch_size() -> u32 {
    DEFAULT_PEEK_BATCH_SIZE
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
