//! Notification of committed events.
//!
//! A bus is told about each event only after the store has durably accepted
//! it. Delivery is best-effort: the event store remains the source of truth,
//! so consumers must tolerate duplicates when a failed save is retried.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::EventEnvelope;

/// Errors raised while publishing an event.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// The transport behind the bus could not be reached.
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),
}

/// Publishes committed events to the rest of the system.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), EventBusError>;
}

#[async_trait]
impl<T: EventBus + ?Sized> EventBus for Arc<T> {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), EventBusError> {
        (**self).publish(event).await
    }
}

/// Bus that accepts and discards every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullEventBus;

#[async_trait]
impl EventBus for NullEventBus {
    async fn publish(&self, _event: &EventEnvelope) -> Result<(), EventBusError> {
        Ok(())
    }
}

/// In-memory bus that records every published event in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    published: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events published so far, oldest first.
    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.published.read().await.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), EventBusError> {
        self.published.write().await.push(event.clone());
        Ok(())
    }
}
