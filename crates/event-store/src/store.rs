use std::sync::Arc;

use async_trait::async_trait;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

/// Durable, append-only storage for aggregate events.
///
/// Implementations own the one-event-per-version invariant: appending an
/// event whose `(aggregate_id, version)` pair already exists must fail with
/// [`EventStoreError::ConcurrencyConflict`]. That uniqueness check is the only
/// thing serializing concurrent writers of the same aggregate.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Retrieves all events for a specific aggregate.
    ///
    /// Events are returned in ascending version order. An aggregate with no
    /// history yields an empty list, not an error.
    async fn read_events(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>>;

    /// Appends a single event, recording who performed it when known.
    async fn append_event(
        &self,
        event: EventEnvelope,
        performed_by: Option<&AggregateId>,
    ) -> Result<()>;
}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    async fn read_events(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>> {
        (**self).read_events(aggregate_id).await
    }

    async fn append_event(
        &self,
        event: EventEnvelope,
        performed_by: Option<&AggregateId>,
    ) -> Result<()> {
        (**self).append_event(event, performed_by).await
    }
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Gets the current version of an aggregate.
    ///
    /// Returns None if the aggregate has no events.
    async fn current_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        let events = self.read_events(aggregate_id).await?;
        Ok(events.last().map(|e| e.version))
    }

    /// Checks if an aggregate exists (has any events).
    async fn aggregate_exists(&self, aggregate_id: &AggregateId) -> Result<bool> {
        Ok(self.current_version(aggregate_id).await?.is_some())
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates the structural fields of an event before appending.
pub fn validate_event_for_append(event: &EventEnvelope) -> Result<()> {
    if !event.aggregate_id.is_valid() {
        return Err(EventStoreError::InvalidEnvelope(format!(
            "aggregate id {} is not valid",
            event.aggregate_id
        )));
    }

    if event.event_id.is_nil() {
        return Err(EventStoreError::InvalidEnvelope(
            "event id is not set".to_string(),
        ));
    }

    if event.version < Version::first() {
        return Err(EventStoreError::InvalidEnvelope(format!(
            "version {} precedes the first version",
            event.version
        )));
    }

    if event.event_type.is_empty() {
        return Err(EventStoreError::InvalidEnvelope(
            "event type is empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventId;

    fn envelope() -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::generate("TestAggregate"))
            .event_type("TestEvent")
            .version(Version::first())
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_well_formed_event() {
        assert!(validate_event_for_append(&envelope()).is_ok());
    }

    #[test]
    fn rejects_nil_event_id() {
        let mut event = envelope();
        event.event_id = EventId::nil();
        assert!(matches!(
            validate_event_for_append(&event),
            Err(EventStoreError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn rejects_invalid_aggregate_id() {
        let mut event = envelope();
        event.aggregate_id = AggregateId::new("", uuid::Uuid::new_v4());
        assert!(validate_event_for_append(&event).is_err());
    }

    #[test]
    fn rejects_sentinel_version() {
        let mut event = envelope();
        event.version = Version::initial();
        assert!(validate_event_for_append(&event).is_err());
    }
}
