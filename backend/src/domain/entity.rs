//! Identifiers and the versioned envelope the entity store hands out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque integer identity assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Revision of a stored entity. New entities start at revision 1 and every
/// successful save increments it.
pub type Revision = u32;

/// An entity as persisted: its identity, its revision, and its fields.
///
/// Services read a `Stored<T>`, mutate `value` locally, and hand the whole
/// envelope back to the repository, whose `save` succeeds only if the stored
/// revision still matches `revision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    /// Store-assigned identity.
    pub id: EntityId,
    /// Revision observed when the entity was read.
    pub revision: Revision,
    /// Entity fields.
    pub value: T,
}

impl<T> Stored<T> {
    /// Wrap a value read from the store.
    pub fn new(id: EntityId, revision: Revision, value: T) -> Self {
        Self {
            id,
            revision,
            value,
        }
    }
}
