use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one aggregate instance.
///
/// Pairs a `kind` discriminator (the aggregate type name) with a UUID.
/// Two identities are equal only when both parts match, so an id issued for
/// one aggregate type can never address another type's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateId {
    kind: String,
    id: Uuid,
}

impl AggregateId {
    /// Creates an identity from a kind and an existing UUID.
    pub fn new(kind: impl Into<String>, id: Uuid) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    /// Creates an identity with a fresh random UUID.
    pub fn generate(kind: impl Into<String>) -> Self {
        Self::new(kind, Uuid::new_v4())
    }

    /// Returns the aggregate type discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.id
    }

    /// Returns true when the kind is non-empty and the UUID is not nil.
    pub fn is_valid(&self) -> bool {
        !self.kind.is_empty() && !self.id.is_nil()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}|{}]", self.kind, self.id)
    }
}

impl From<AggregateId> for Uuid {
    fn from(id: AggregateId) -> Self {
        id.id
    }
}
