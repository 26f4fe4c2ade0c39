//! Typed events as issued and applied by aggregates.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::{EventEnvelope, EventId, EventStoreError, Version, storage_precision};
use serde::{Deserialize, Serialize, de::Error as _};

use crate::aggregate::DomainEvent;

/// An immutable fact about one aggregate instance.
///
/// `Event::new` fills in a fresh identity, the current time, no target
/// aggregate and the sentinel version; issuing the event through an
/// aggregate stamps the target identity and the version it produces.
/// Equality is structural over every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<E> {
    pub event_id: EventId,
    pub aggregate_id: Option<AggregateId>,
    pub aggregate_version: Version,
    pub created: DateTime<Utc>,
    pub payload: E,
}

impl<E: DomainEvent> Event<E> {
    /// Wraps a payload with default identity and timestamp.
    pub fn new(payload: E) -> Self {
        Self {
            event_id: EventId::new(),
            aggregate_id: None,
            aggregate_version: Version::initial(),
            created: storage_precision(Utc::now()),
            payload,
        }
    }

    /// Targets the event at `aggregate_id`.
    ///
    /// Only needed for the event that creates an aggregate; later events take
    /// the identity of the aggregate issuing them.
    pub fn for_aggregate(mut self, aggregate_id: AggregateId) -> Self {
        self.aggregate_id = Some(aggregate_id);
        self
    }

    /// Overrides the generated event ID.
    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        self.event_id = event_id;
        self
    }

    /// Overrides the creation timestamp, truncated to microseconds.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = storage_precision(created);
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Converts the event into its storage form.
    ///
    /// Fails when the event has not been issued to an aggregate yet or the
    /// payload cannot be serialized.
    pub fn to_envelope(&self) -> Result<EventEnvelope, EventStoreError> {
        let aggregate_id = self
            .aggregate_id
            .clone()
            .ok_or(EventStoreError::MissingField("aggregate_id"))?;

        EventEnvelope::builder()
            .event_id(self.event_id)
            .event_type(self.event_type())
            .aggregate_id(aggregate_id)
            .version(self.aggregate_version)
            .created(self.created)
            .payload(&self.payload)?
            .build()
    }

    /// Decodes a stored envelope into a typed event.
    ///
    /// The stored `event_type` must name the variant the payload decodes to.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, serde_json::Error> {
        let payload: E = serde_json::from_value(envelope.payload)?;

        if payload.event_type() != envelope.event_type {
            return Err(serde_json::Error::custom(format!(
                "payload decodes as {} but is stored as {}",
                payload.event_type(),
                envelope.event_type
            )));
        }

        Ok(Self {
            event_id: envelope.event_id,
            aggregate_id: Some(envelope.aggregate_id),
            aggregate_version: envelope.version,
            created: envelope.created,
            payload,
        })
    }
}
