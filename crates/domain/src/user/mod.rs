//! User aggregate and related types.

mod aggregate;
mod events;

pub use aggregate::User;
pub use events::{EmailChangedData, UserEvent, UserRegisteredData};

use thiserror::Error;

use crate::error::AggregateError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Email must contain a local part and a domain.
    #[error("Invalid email: {0:?}")]
    InvalidEmail(String),

    /// User is already registered.
    #[error("User already registered")]
    AlreadyRegistered,

    /// User has not been registered yet.
    #[error("User not registered")]
    NotRegistered,

    /// The aggregate refused the event.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
