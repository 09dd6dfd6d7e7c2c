//! Ports for speaker, presentation and meetup persistence.
//!
//! Each repository exposes the same five operations over one entity kind.
//! Entities travel inside a [`Stored`] envelope carrying the revision the
//! caller observed, which makes [`save`](SpeakerRepository::save) a single-key
//! compare-and-swap:
//!
//! - New entities start at revision 1.
//! - `save` succeeds only when the stored revision equals `entity.revision`,
//!   and returns the envelope with the incremented revision.
//! - A stale revision yields [`EntityStoreError::RevisionMismatch`] and leaves
//!   the stored value untouched.
//!
//! Adapters give read-after-write consistency per key and nothing more; there
//! are no multi-key transactions.

use async_trait::async_trait;

use crate::domain::{EntityId, Meetup, Presentation, Revision, Speaker, Stored};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity store adapters.
    pub enum EntityStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "entity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "entity store query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: Revision, actual: Revision } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// The addressed entity does not exist.
        Missing { id: String } =>
            "entity {id} does not exist",
    }
}

/// Port for speaker profile storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeakerRepository: Send + Sync {
    /// Fetch one speaker; `None` when absent.
    async fn get(&self, id: EntityId) -> Result<Option<Stored<Speaker>>, EntityStoreError>;

    /// Every stored speaker in id order.
    async fn list(&self) -> Result<Vec<Stored<Speaker>>, EntityStoreError>;

    /// Store a new speaker and assign its id.
    async fn insert(&self, speaker: Speaker) -> Result<Stored<Speaker>, EntityStoreError>;

    /// Compare-and-swap on `speaker.revision`.
    async fn save(&self, speaker: &Stored<Speaker>) -> Result<Stored<Speaker>, EntityStoreError>;

    /// Remove a speaker; [`EntityStoreError::Missing`] when absent.
    async fn delete(&self, id: EntityId) -> Result<(), EntityStoreError>;
}

/// Port for presentation storage, including voter sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresentationRepository: Send + Sync {
    /// Fetch one presentation; `None` when absent.
    async fn get(&self, id: EntityId)
    -> Result<Option<Stored<Presentation>>, EntityStoreError>;

    /// Every stored presentation in id order.
    async fn list(&self) -> Result<Vec<Stored<Presentation>>, EntityStoreError>;

    /// Store a new presentation and assign its id.
    async fn insert(
        &self,
        presentation: Presentation,
    ) -> Result<Stored<Presentation>, EntityStoreError>;

    /// Compare-and-swap on `presentation.revision`.
    async fn save(
        &self,
        presentation: &Stored<Presentation>,
    ) -> Result<Stored<Presentation>, EntityStoreError>;

    /// Remove a presentation; [`EntityStoreError::Missing`] when absent.
    async fn delete(&self, id: EntityId) -> Result<(), EntityStoreError>;
}

/// Port for meetup storage, including the external event id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetupRepository: Send + Sync {
    /// Fetch one meetup; `None` when absent.
    async fn get(&self, id: EntityId) -> Result<Option<Stored<Meetup>>, EntityStoreError>;

    /// Every stored meetup in id order.
    async fn list(&self) -> Result<Vec<Stored<Meetup>>, EntityStoreError>;

    /// Store a new meetup and assign its id.
    async fn insert(&self, meetup: Meetup) -> Result<Stored<Meetup>, EntityStoreError>;

    /// Compare-and-swap on `meetup.revision`.
    async fn save(&self, meetup: &Stored<Meetup>) -> Result<Stored<Meetup>, EntityStoreError>;

    /// Remove a meetup; [`EntityStoreError::Missing`] when absent.
    async fn delete(&self, id: EntityId) -> Result<(), EntityStoreError>;
}
