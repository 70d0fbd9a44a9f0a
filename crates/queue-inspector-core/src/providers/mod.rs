//! Messaging backend implementations.
//!
//! This module contains concrete implementations of the [`ReceiverFactory`]
//! and [`MessageReceiver`] traits.
//!
//! [`ReceiverFactory`]: crate::client::ReceiverFactory
//! [`MessageReceiver`]: crate::client::MessageReceiver

#[cfg(feature = "azure")]
pub mod azure;
pub mod memory;

#[cfg(feature = "azure")]
pub use azure::{AzureServiceBusConnector, AzureServiceBusFactory, AZURE_PROVIDER};
pub use memory::{InMemoryReceiver, InMemoryServiceBus, IN_MEMORY_PROVIDER};
