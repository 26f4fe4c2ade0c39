//! Core aggregate and domain event traits.

use std::fmt::Debug;

use common::AggregateId;
use event_store::{EventId, Version};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::AggregateError;
use crate::event::Event;

/// Trait for domain events.
///
/// Each aggregate declares one enum implementing this trait, one variant per
/// business fact. The enum is the closed set of events the aggregate can
/// apply, so an unhandled variant is a compile error in [`Aggregate::apply`].
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + Debug + PartialEq {
    /// Returns the event type name.
    ///
    /// Stored alongside the payload and used as the type discriminator when
    /// reading events back.
    fn event_type(&self) -> &'static str;
}

/// Identity, version and pending events of an aggregate.
///
/// Every aggregate embeds one of these and exposes it through
/// [`Aggregate::root`]; the provided methods of [`Aggregate`] keep its
/// invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRoot<E> {
    id: Option<AggregateId>,
    version: Version,
    uncommitted: Vec<Event<E>>,
}

impl<E> Default for AggregateRoot<E> {
    fn default() -> Self {
        Self {
            id: None,
            version: Version::initial(),
            uncommitted: Vec::new(),
        }
    }
}

impl<E: DomainEvent> AggregateRoot<E> {
    pub fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn uncommitted_events(&self) -> &[Event<E>] {
        &self.uncommitted
    }

    fn is_uncommitted(&self, event_id: EventId) -> bool {
        self.uncommitted.iter().any(|e| e.event_id == event_id)
    }

    /// Stamps a new event with this aggregate's identity and next version.
    fn hydrate(&self, event: Event<E>) -> Result<Event<E>, AggregateError> {
        let aggregate_id = match self.id.as_ref().or(event.aggregate_id.as_ref()) {
            Some(id) if id.is_valid() => id.clone(),
            Some(id) => return Err(AggregateError::InvalidAggregateId(id.to_string())),
            None => return Err(AggregateError::MissingAggregateId),
        };

        if event.event_id.is_nil() {
            return Err(AggregateError::InvalidEventId(event.event_id));
        }

        Ok(Event {
            aggregate_id: Some(aggregate_id),
            aggregate_version: self.version.next(),
            ..event
        })
    }
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate's state is derived entirely from the events it has applied.
/// Domain methods call [`issue_event`](Aggregate::issue_event) to record new
/// facts; the repository replays stored facts through
/// [`apply_event`](Aggregate::apply_event).
///
/// The `Default` bound is the zero-argument constructor used for replay.
/// Aggregates are not synchronized; mutate one instance from one task.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    ///
    /// Used as the `kind` of every identity this aggregate owns.
    fn aggregate_type() -> &'static str;

    fn root(&self) -> &AggregateRoot<Self::Event>;

    fn root_mut(&mut self) -> &mut AggregateRoot<Self::Event>;

    /// Applies an event payload to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: &Self::Event);

    /// Returns the aggregate's identity, None until the first event.
    fn id(&self) -> Option<&AggregateId> {
        self.root().id()
    }

    /// Returns the version of the last applied event, or
    /// [`Version::initial`] for an aggregate with no events.
    fn version(&self) -> Version {
        self.root().version()
    }

    /// Returns events issued but not yet saved, in issue order.
    fn uncommitted_events(&self) -> &[Event<Self::Event>] {
        self.root().uncommitted_events()
    }

    /// Forgets the pending events. Called by the repository after a save.
    fn clear_uncommitted_events(&mut self) {
        self.root_mut().uncommitted.clear();
    }

    /// Applies an already-stamped event.
    ///
    /// A no-op when the event is already pending or its version is not newer
    /// than the aggregate's, so re-delivering an event never changes state.
    /// Otherwise adopts the event's identity if none is set, dispatches the
    /// payload to [`apply`](Aggregate::apply) and advances the version.
    fn apply_event(&mut self, event: &Event<Self::Event>) {
        let root = self.root();
        if root.is_uncommitted(event.event_id) || event.aggregate_version <= root.version() {
            return;
        }

        if self.root().id.is_none() {
            self.root_mut().id = event.aggregate_id.clone();
        }

        self.apply(&event.payload);

        self.root_mut().version = event.aggregate_version;
    }

    /// Records a new event.
    ///
    /// Stamps it with the aggregate's identity (or, for the first event, the
    /// identity the event targets) and the next version, applies it, and
    /// queues it for saving.
    fn issue_event(&mut self, event: Event<Self::Event>) -> Result<(), AggregateError> {
        let event = self.root().hydrate(event)?;

        self.apply_event(&event);
        self.root_mut().uncommitted.push(event);

        Ok(())
    }

    /// Issues a payload with a fresh event identity.
    fn issue(&mut self, payload: Self::Event) -> Result<(), AggregateError> {
        self.issue_event(Event::new(payload))
    }
}
