use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Result,
    store::{EventStore, validate_event_for_append},
};

#[derive(Debug, Clone)]
struct StoredEvent {
    envelope: EventEnvelope,
    performed_by: Option<AggregateId>,
}

/// In-memory event store implementation for testing.
///
/// Each instance owns its own log; clones share it. The write lock is held
/// across the uniqueness check and the insert, so concurrent appends for the
/// same aggregate version resolve to exactly one success.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns who performed the event, if it was recorded.
    pub async fn performed_by(&self, event_id: EventId) -> Option<AggregateId> {
        self.events
            .read()
            .await
            .iter()
            .find(|e| e.envelope.event_id == event_id)
            .and_then(|e| e.performed_by.clone())
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn read_events(&self, aggregate_id: &AggregateId) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| &e.envelope.aggregate_id == aggregate_id)
            .map(|e| e.envelope.clone())
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn append_event(
        &self,
        event: EventEnvelope,
        performed_by: Option<&AggregateId>,
    ) -> Result<()> {
        validate_event_for_append(&event)?;

        let mut store = self.events.write().await;

        // Unique constraint simulation
        for existing in store.iter() {
            if existing.envelope.event_id == event.event_id {
                return Err(EventStoreError::DuplicateEvent(event.event_id));
            }
            if existing.envelope.aggregate_id == event.aggregate_id
                && existing.envelope.version == event.version
            {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: event.aggregate_id,
                    version: event.version,
                });
            }
        }

        store.push(StoredEvent {
            envelope: event,
            performed_by: performed_by.cloned(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    fn create_test_event(
        aggregate_id: &AggregateId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id.clone())
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");
        let event = create_test_event(&aggregate_id, Version::first(), "TestEvent");

        let result = store.append_event(event, None).await;
        assert!(result.is_ok());

        let events = store.read_events(&aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].version, Version::first());
    }

    #[tokio::test]
    async fn read_unknown_aggregate_returns_empty() {
        let store = InMemoryEventStore::new();
        let events = store
            .read_events(&AggregateId::generate("TestAggregate"))
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn read_returns_ascending_versions_for_one_aggregate() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::generate("TestAggregate");
        let id2 = AggregateId::generate("TestAggregate");

        // Appended out of order on purpose
        store
            .append_event(create_test_event(&id1, Version::new(1), "Event2"), None)
            .await
            .unwrap();
        store
            .append_event(create_test_event(&id2, Version::first(), "Other"), None)
            .await
            .unwrap();
        store
            .append_event(create_test_event(&id1, Version::first(), "Event1"), None)
            .await
            .unwrap();

        let events = store.read_events(&id1).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "Event1");
        assert_eq!(events[1].event_type, "Event2");
    }

    #[tokio::test]
    async fn same_uuid_different_kind_is_a_different_stream() {
        let store = InMemoryEventStore::new();
        let uuid = uuid::Uuid::new_v4();
        let user = AggregateId::new("User", uuid);
        let order = AggregateId::new("Order", uuid);

        store
            .append_event(create_test_event(&user, Version::first(), "UserRegistered"), None)
            .await
            .unwrap();
        store
            .append_event(create_test_event(&order, Version::first(), "OrderCreated"), None)
            .await
            .unwrap();

        assert_eq!(store.read_events(&user).await.unwrap().len(), 1);
        assert_eq!(store.read_events(&order).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrency_conflict_on_existing_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");

        store
            .append_event(
                create_test_event(&aggregate_id, Version::first(), "Event1"),
                None,
            )
            .await
            .unwrap();

        let result = store
            .append_event(
                create_test_event(&aggregate_id, Version::first(), "Event1Again"),
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { version, .. }) if version == Version::first()
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_event_id_is_rejected() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");
        let event = create_test_event(&aggregate_id, Version::first(), "Event1");

        store.append_event(event.clone(), None).await.unwrap();

        let mut replay = event;
        replay.version = Version::new(1);
        let result = store.append_event(replay, None).await;

        assert!(matches!(result, Err(EventStoreError::DuplicateEvent(_))));
    }

    #[tokio::test]
    async fn concurrent_appends_for_same_version_have_one_winner() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");

        let a = store.append_event(
            create_test_event(&aggregate_id, Version::first(), "A"),
            None,
        );
        let b = store.append_event(
            create_test_event(&aggregate_id, Version::first(), "B"),
            None,
        );
        let (a, b) = tokio::join!(a, b);

        assert!(a.is_ok() ^ b.is_ok());
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn records_performed_by() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");
        let actor = AggregateId::generate("User");
        let event = create_test_event(&aggregate_id, Version::first(), "Event1");
        let event_id = event.event_id;

        store.append_event(event, Some(&actor)).await.unwrap();

        assert_eq!(store.performed_by(event_id).await, Some(actor));
    }

    #[tokio::test]
    async fn instances_do_not_share_state() {
        let store1 = InMemoryEventStore::new();
        let store2 = InMemoryEventStore::new();
        let aggregate_id = AggregateId::generate("TestAggregate");

        store1
            .append_event(
                create_test_event(&aggregate_id, Version::first(), "Event1"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(store1.event_count().await, 1);
        assert_eq!(store2.event_count().await, 0);

        let clone = store1.clone();
        clone.clear().await;
        assert_eq!(store1.event_count().await, 0);
    }

    #[tokio::test]
    async fn rejects_invalid_envelope() {
        let store = InMemoryEventStore::new();
        let mut event = create_test_event(
            &AggregateId::generate("TestAggregate"),
            Version::first(),
            "Event1",
        );
        event.event_id = EventId::nil();

        let result = store.append_event(event, None).await;
        assert!(matches!(result, Err(EventStoreError::InvalidEnvelope(_))));
    }
}
