//! Storage and notification contracts for the event-sourcing core.
//!
//! Stores persist [`EventEnvelope`]s opaquely and enforce one event per
//! aggregate version; buses announce events once they are committed.

pub mod bus;
pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use bus::{EventBus, EventBusError, InMemoryEventBus, NullEventBus};
pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version, storage_precision};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{EventStore, EventStoreExt};
