//! Caller identity and the single ownership check used by every mutation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Error;

/// Opaque identity of an authenticated user (typically an e-mail address
/// asserted by the fronting authentication proxy).
///
/// ## Invariants
/// - Non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserIdentity(String);

/// Validation errors returned when constructing [`UserIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserIdentityValidationError {
    /// Identity is empty after trimming whitespace.
    #[error("user identity must not be empty")]
    Empty,
    /// Identity has leading or trailing whitespace.
    #[error("user identity must not contain surrounding whitespace")]
    ContainsWhitespace,
}

impl UserIdentity {
    /// Validate and wrap a raw identity.
    ///
    /// # Examples
    /// ```
    /// use meetup_backend::domain::UserIdentity;
    ///
    /// let id = UserIdentity::new("ada@example.com").expect("valid identity");
    /// assert_eq!(id.as_str(), "ada@example.com");
    /// assert!(UserIdentity::new("  ").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, UserIdentityValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(UserIdentityValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(UserIdentityValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for UserIdentity {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for UserIdentity {
    type Error = UserIdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserIdentity> for String {
    fn from(value: UserIdentity) -> Self {
        value.0
    }
}

/// Authenticated caller of a domain operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    identity: UserIdentity,
    is_admin: bool,
}

impl Caller {
    /// Regular authenticated user.
    #[must_use]
    pub fn user(identity: UserIdentity) -> Self {
        Self {
            identity,
            is_admin: false,
        }
    }

    /// Authenticated user holding the admin role.
    #[must_use]
    pub fn admin(identity: UserIdentity) -> Self {
        Self {
            identity,
            is_admin: true,
        }
    }

    /// Identity of the caller.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Whether the caller may act on entities owned by others.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Require the admin role.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::unauthorized("admin role required"))
        }
    }
}

/// Allow the owner of an entity, or any admin, to mutate it.
///
/// # Examples
/// ```
/// use meetup_backend::domain::{Caller, UserIdentity, authorize};
///
/// let owner = UserIdentity::new("owner@example.com").expect("valid");
/// let stranger = Caller::user(UserIdentity::new("x@example.com").expect("valid"));
/// assert!(authorize(&owner, &stranger).is_err());
/// assert!(authorize(&owner, &Caller::user(owner.clone())).is_ok());
/// ```
pub fn authorize(owner: &UserIdentity, caller: &Caller) -> Result<(), Error> {
    if caller.is_admin() || caller.identity() == owner {
        return Ok(());
    }
    Err(Error::unauthorized(
        "only the owner or an admin may modify this resource",
    ))
}
