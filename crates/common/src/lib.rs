//! Identity types shared across the event-sourcing crates.

mod types;

pub use types::AggregateId;
