//! User domain events.

use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a user aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    /// User was registered.
    UserRegistered(UserRegisteredData),

    /// User's email address was changed.
    EmailChanged(EmailChangedData),
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserRegistered(_) => "UserRegistered",
            UserEvent::EmailChanged(_) => "EmailChanged",
        }
    }
}

/// Data for UserRegistered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRegisteredData {
    pub email: String,

    /// Identifier assigned by the external authentication provider.
    pub auth_id: String,
}

/// Data for EmailChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailChangedData {
    pub email: String,
}
