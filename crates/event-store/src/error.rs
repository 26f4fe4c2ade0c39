use thiserror::Error;

use crate::{AggregateId, EventId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// An event already exists at this version of the aggregate.
    ///
    /// The caller must reload the aggregate and replay before retrying.
    #[error("Concurrency conflict for aggregate {aggregate_id}: version {version} already exists")]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        version: Version,
    },

    /// An event with this ID has already been appended.
    #[error("Event {0} has already been appended")]
    DuplicateEvent(EventId),

    /// The aggregate was not found in the event store.
    #[error("Aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// The backing storage could not be reached.
    #[error("Event store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured table name is not a plain SQL identifier.
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// An envelope failed structural validation before append.
    #[error("Invalid event envelope: {0}")]
    InvalidEnvelope(String),

    /// An envelope was built without a required field.
    #[error("Missing envelope field: {0}")]
    MissingField(&'static str),
}

impl EventStoreError {
    /// Returns true when the append collided with an existing event.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::DuplicateEvent(_)
        )
    }

    /// Returns true for transport failures (timeouts, lost connections,
    /// pool exhaustion). Decoding and query errors are not included.
    pub fn is_communication(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
            ),
            _ => false,
        }
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
