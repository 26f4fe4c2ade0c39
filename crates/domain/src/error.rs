//! Domain error types.

use common::AggregateId;
use event_store::{EventBusError, EventId, EventStoreError};
use thiserror::Error;

/// Errors raised when an aggregate refuses to issue an event.
///
/// The aggregate is left unchanged when one of these is returned.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Neither the aggregate nor the event carries an identity.
    #[error("Aggregate has no identity and the event does not target one")]
    MissingAggregateId,

    /// The identity has an empty kind or a nil UUID.
    #[error("Invalid aggregate id: {0}")]
    InvalidAggregateId(String),

    /// The event was given a nil event ID.
    #[error("Invalid event id: {0}")]
    InvalidEventId(EventId),
}

/// Errors that can occur while loading or saving aggregates.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached. The original failure is the source.
    #[error("Unable to access persistence layer")]
    Communication(#[source] EventStoreError),

    /// The store rejected the operation, e.g. a concurrency conflict.
    #[error(transparent)]
    Store(EventStoreError),

    /// An event was stored but could not be published.
    ///
    /// The event and everything before it are committed. The aggregate keeps
    /// its whole uncommitted queue; reload it before retrying.
    #[error("Event {event_id} was stored but could not be published")]
    Publish {
        event_id: EventId,
        #[source]
        source: EventBusError,
    },

    /// A pending event could not be converted to its storage form.
    #[error("Event {event_id} could not be encoded")]
    Encode {
        event_id: EventId,
        #[source]
        source: EventStoreError,
    },

    /// A stored event does not match any event the aggregate understands.
    #[error("Event {event_id} of type {event_type} cannot be applied to {aggregate_type}")]
    Dispatch {
        aggregate_type: &'static str,
        event_type: String,
        event_id: EventId,
        #[source]
        source: serde_json::Error,
    },

    /// The requested identity belongs to a different aggregate type.
    #[error("Aggregate {id} is not a {expected}")]
    KindMismatch {
        expected: &'static str,
        id: AggregateId,
    },
}

impl RepositoryError {
    /// Wraps a store failure, separating transport failures from rejections.
    pub(crate) fn from_store(err: EventStoreError) -> Self {
        if err.is_communication() {
            Self::Communication(err)
        } else {
            Self::Store(err)
        }
    }

    /// Returns true when a save lost an optimistic concurrency race.
    ///
    /// The caller should reload the aggregate and retry its command.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::Version;

    #[test]
    fn communication_failures_are_wrapped() {
        let err = RepositoryError::from_store(EventStoreError::Unavailable("timeout".to_string()));

        assert!(matches!(err, RepositoryError::Communication(_)));
        assert_eq!(err.to_string(), "Unable to access persistence layer");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("timeout"));
    }

    #[test]
    fn conflicts_pass_through() {
        let err = RepositoryError::from_store(EventStoreError::ConcurrencyConflict {
            aggregate_id: AggregateId::generate("User"),
            version: Version::new(2),
        });

        assert!(matches!(err, RepositoryError::Store(_)));
        assert!(err.is_conflict());
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn corrupt_data_is_not_wrapped_as_communication() {
        let corrupt = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RepositoryError::from_store(EventStoreError::Serialization(corrupt));

        assert!(matches!(err, RepositoryError::Store(_)));
        assert_ne!(err.to_string(), "Unable to access persistence layer");
    }

    #[test]
    fn publish_failure_is_not_a_conflict() {
        let err = RepositoryError::Publish {
            event_id: EventId::new(),
            source: EventBusError::Unavailable("broker down".to_string()),
        };
        assert!(!err.is_conflict());
    }
}
