//! Domain layer for the event-sourcing system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait with event issuing, replay and uncommitted-event tracking
//! - DomainEvent trait and the typed Event wrapper
//! - Repository for loading and saving aggregates
//! - User aggregate implementation

pub mod aggregate;
pub mod error;
pub mod event;
pub mod repository;
pub mod user;

pub use aggregate::{Aggregate, AggregateRoot, DomainEvent};
pub use error::{AggregateError, RepositoryError};
pub use event::Event;
pub use repository::Repository;
pub use user::{EmailChangedData, User, UserError, UserEvent, UserRegisteredData};
