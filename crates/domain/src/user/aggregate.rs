//! User aggregate implementation.

use common::AggregateId;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::event::Event;

use super::{EmailChangedData, UserError, UserEvent, UserRegisteredData};

/// User aggregate root.
///
/// Holds a user's contact email and the identity issued by the
/// authentication provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    root: AggregateRoot<UserEvent>,
    email: String,
    auth_id: String,
}

impl Aggregate for User {
    type Event = UserEvent;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn root(&self) -> &AggregateRoot<UserEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<UserEvent> {
        &mut self.root
    }

    fn apply(&mut self, event: &UserEvent) {
        match event {
            UserEvent::UserRegistered(data) => {
                self.email = data.email.clone();
                self.auth_id = data.auth_id.clone();
            }
            UserEvent::EmailChanged(data) => self.email = data.email.clone(),
        }
    }
}

// Command methods
impl User {
    /// Generates a fresh user identity.
    pub fn new_id() -> AggregateId {
        AggregateId::generate(Self::aggregate_type())
    }

    /// Registers a new user under `id`.
    pub fn register(
        id: AggregateId,
        email: impl Into<String>,
        auth_id: impl Into<String>,
    ) -> Result<Self, UserError> {
        let mut user = Self::default();
        user.register_as(id, email.into(), auth_id.into())?;
        Ok(user)
    }

    fn register_as(
        &mut self,
        id: AggregateId,
        email: String,
        auth_id: String,
    ) -> Result<(), UserError> {
        if self.id().is_some() {
            return Err(UserError::AlreadyRegistered);
        }
        validate_email(&email)?;

        let event = Event::new(UserEvent::UserRegistered(UserRegisteredData { email, auth_id }))
            .for_aggregate(id);
        self.issue_event(event)?;
        Ok(())
    }

    /// Changes the user's email. Changing to the current email is a no-op.
    pub fn change_email(&mut self, email: impl Into<String>) -> Result<(), UserError> {
        let email = email.into();
        if self.id().is_none() {
            return Err(UserError::NotRegistered);
        }
        validate_email(&email)?;

        if email == self.email {
            return Ok(());
        }

        self.issue(UserEvent::EmailChanged(EmailChangedData { email }))?;
        Ok(())
    }
}

// Query methods
impl User {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn auth_id(&self) -> &str {
        &self.auth_id
    }
}

fn validate_email(email: &str) -> Result<(), UserError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(UserError::InvalidEmail(email.to_string())),
    }
}
