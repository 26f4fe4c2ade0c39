//! Loading and saving aggregates through an event store and event bus.

use common::AggregateId;
use event_store::{EventBus, EventStore, EventStoreError, NullEventBus};

use crate::aggregate::Aggregate;
use crate::error::RepositoryError;
use crate::event::Event;

/// Loads aggregates by replaying their history and saves their new events.
///
/// The repository holds no aggregate state between calls. Concurrent saves
/// for the same identity are serialized only by the store's version
/// uniqueness: one wins, the other gets a conflict.
#[derive(Debug, Clone)]
pub struct Repository<S, B = NullEventBus> {
    store: S,
    bus: B,
}

impl<S: EventStore> Repository<S> {
    /// Creates a repository that does not publish events.
    pub fn new(store: S) -> Self {
        Self::with_bus(store, NullEventBus)
    }
}

impl<S: EventStore, B: EventBus> Repository<S, B> {
    pub fn with_bus(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Loads an aggregate by replaying its events.
    ///
    /// Returns `Ok(None)` when the store has no history for `id`. The
    /// returned aggregate has no uncommitted events.
    #[tracing::instrument(skip(self, id), fields(aggregate_type = A::aggregate_type(), aggregate_id = %id))]
    pub async fn get_by_id<A: Aggregate>(
        &self,
        id: &AggregateId,
    ) -> Result<Option<A>, RepositoryError> {
        if id.kind() != A::aggregate_type() {
            return Err(RepositoryError::KindMismatch {
                expected: A::aggregate_type(),
                id: id.clone(),
            });
        }

        let envelopes = match self.store.read_events(id).await {
            Ok(envelopes) => envelopes,
            Err(EventStoreError::AggregateNotFound(_)) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read events");
                return Err(RepositoryError::from_store(err));
            }
        };

        if envelopes.is_empty() {
            metrics::counter!("repository_aggregates_not_found_total").increment(1);
            tracing::debug!("Aggregate not found");
            return Ok(None);
        }

        let replayed = envelopes.len();
        let mut aggregate = A::default();

        for envelope in envelopes {
            let event_id = envelope.event_id;
            let event_type = envelope.event_type.clone();

            let event = Event::<A::Event>::from_envelope(envelope).map_err(|source| {
                RepositoryError::Dispatch {
                    aggregate_type: A::aggregate_type(),
                    event_type,
                    event_id,
                    source,
                }
            })?;

            aggregate.apply_event(&event);
        }

        metrics::histogram!("repository_replay_events").record(replayed as f64);
        metrics::counter!("repository_aggregates_loaded_total").increment(1);
        tracing::debug!(version = %aggregate.version(), replayed, "Loaded aggregate");

        Ok(Some(aggregate))
    }

    /// Appends and publishes the aggregate's uncommitted events in order,
    /// then clears them.
    ///
    /// Each event is appended, then published, before the next is appended.
    /// On failure the method returns at once: events already appended stay
    /// committed and the uncommitted queue is left intact, so reload the
    /// aggregate before retrying.
    #[tracing::instrument(
        skip_all,
        fields(
            aggregate_type = A::aggregate_type(),
            aggregate_id = ?aggregate.id(),
            pending = aggregate.uncommitted_events().len(),
        )
    )]
    pub async fn save<A: Aggregate>(
        &self,
        aggregate: &mut A,
        performed_by: Option<&AggregateId>,
    ) -> Result<(), RepositoryError> {
        let result = self.append_and_publish(aggregate, performed_by).await;

        match &result {
            Ok(()) => aggregate.clear_uncommitted_events(),
            Err(err) => {
                metrics::counter!("repository_save_failures_total").increment(1);
                tracing::warn!(error = %err, "Failed to save aggregate");
            }
        }

        result
    }

    async fn append_and_publish<A: Aggregate>(
        &self,
        aggregate: &A,
        performed_by: Option<&AggregateId>,
    ) -> Result<(), RepositoryError> {
        for event in aggregate.uncommitted_events() {
            let envelope = event
                .to_envelope()
                .map_err(|source| RepositoryError::Encode {
                    event_id: event.event_id,
                    source,
                })?;

            self.store
                .append_event(envelope.clone(), performed_by)
                .await
                .map_err(RepositoryError::from_store)?;

            metrics::counter!("repository_events_appended_total").increment(1);
            tracing::debug!(
                event_id = %envelope.event_id,
                event_type = %envelope.event_type,
                version = %envelope.version,
                "Appended event"
            );

            self.bus
                .publish(&envelope)
                .await
                .map_err(|source| RepositoryError::Publish {
                    event_id: envelope.event_id,
                    source,
                })?;
        }

        Ok(())
    }
}
