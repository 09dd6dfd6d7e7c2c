//! Meetup use cases and the sync attempts they trigger.
//!
//! Sync is not transactional with the local write. A create or update that
//! commits locally succeeds even when the events service call fails; the
//! returned [`MeetupChange`] carries the sync result so the caller can retry
//! the sync separately.

use std::sync::Arc;

use futures_util::future::try_join_all;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use super::ports::{EntityStoreError, MeetupRepository, PresentationRepository};
use super::store_access::{map_store_error, not_found, store_call};
use super::sync::{SyncEngine, SyncError, SyncOutcome, SyncReport};
use super::{Caller, Deadline, EntityId, Error, Meetup, MeetupDetails, Stored, authorize};

/// Attempts at applying an edit while a sync write-back races it.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// A committed meetup mutation and the sync attempt that followed it.
#[derive(Debug, Clone)]
pub struct MeetupChange {
    pub meetup: Stored<Meetup>,
    pub sync: Result<SyncOutcome, SyncError>,
}

/// Meetup CRUD plus sync triggers.
#[derive(Clone)]
pub struct MeetupService {
    meetups: Arc<dyn MeetupRepository>,
    presentations: Arc<dyn PresentationRepository>,
    sync: SyncEngine,
    clock: Arc<dyn Clock>,
}

impl MeetupService {
    pub fn new(
        meetups: Arc<dyn MeetupRepository>,
        presentations: Arc<dyn PresentationRepository>,
        sync: SyncEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            meetups,
            presentations,
            sync,
            clock,
        }
    }

    /// Create a meetup owned by `caller`, then publish it.
    ///
    /// The meetup date and vote end must both lie strictly in the future, and
    /// every referenced presentation must exist.
    pub async fn create(
        &self,
        caller: &Caller,
        details: MeetupDetails,
        deadline: &Deadline,
    ) -> Result<MeetupChange, Error> {
        details.validate_for_creation(self.clock.utc())?;
        self.ensure_presentations_exist(&details.presentations, deadline)
            .await?;
        let meetup = Meetup {
            owner: caller.identity().clone(),
            details,
            external_id: None,
        };
        let mut stored = store_call(deadline, "meetup.insert", self.meetups.insert(meetup)).await?;
        info!(meetup_id = %stored.id, owner = %caller.identity(), "meetup created");

        let sync = match self.sync.create_remote(stored.id, deadline).await {
            Ok(external_id) => {
                stored.value.external_id = Some(external_id.clone());
                Ok(SyncOutcome::Created { external_id })
            }
            Err(err) => {
                warn!(meetup_id = %stored.id, error = %err, "meetup saved but not published");
                Err(err)
            }
        };
        Ok(MeetupChange {
            meetup: stored,
            sync,
        })
    }

    pub async fn get(&self, id: EntityId, deadline: &Deadline) -> Result<Stored<Meetup>, Error> {
        store_call(deadline, "meetup.get", self.meetups.get(id))
            .await?
            .ok_or_else(|| not_found("meetup", id))
    }

    pub async fn list(&self, deadline: &Deadline) -> Result<Vec<Stored<Meetup>>, Error> {
        store_call(deadline, "meetup.list", self.meetups.list()).await
    }

    /// Replace the editable fields, then push them to the published event.
    /// Owner and external id are preserved.
    pub async fn update(
        &self,
        caller: &Caller,
        id: EntityId,
        details: MeetupDetails,
        deadline: &Deadline,
    ) -> Result<MeetupChange, Error> {
        details.validate()?;
        self.ensure_presentations_exist(&details.presentations, deadline)
            .await?;
        let saved = self.save_details(caller, id, details, deadline).await?;
        info!(meetup_id = %id, caller = %caller.identity(), "meetup updated");

        let sync = self.sync.update_one(id, deadline).await;
        if let Err(err) = &sync {
            warn!(meetup_id = %id, error = %err, "meetup updated but event not refreshed");
        }
        Ok(MeetupChange {
            meetup: saved,
            sync,
        })
    }

    /// Delete a meetup. Its published event, if any, is left upstream.
    pub async fn delete(
        &self,
        caller: &Caller,
        id: EntityId,
        deadline: &Deadline,
    ) -> Result<(), Error> {
        let current = self.get(id, deadline).await?;
        authorize(&current.value.owner, caller)?;
        store_call(deadline, "meetup.delete", self.meetups.delete(id)).await?;
        info!(
            meetup_id = %id,
            caller = %caller.identity(),
            external_id = ?current.value.external_id,
            "meetup deleted"
        );
        Ok(())
    }

    /// Admin-only bulk refresh of every published meetup.
    pub async fn sync_all(&self, caller: &Caller, deadline: &Deadline) -> Result<SyncReport, Error> {
        caller.require_admin()?;
        info!(caller = %caller.identity(), "bulk meetup sync requested");
        Ok(self.sync.update_remote(deadline).await?)
    }

    async fn ensure_presentations_exist(
        &self,
        presentations: &[EntityId],
        deadline: &Deadline,
    ) -> Result<(), Error> {
        let lookups = presentations.iter().map(|&id| async move {
            store_call(deadline, "presentation.get", self.presentations.get(id))
                .await
                .map(|found| (id, found.is_some()))
        });
        let unknown: Vec<EntityId> = try_join_all(lookups)
            .await?
            .into_iter()
            .filter_map(|(id, exists)| (!exists).then_some(id))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(
            Error::invalid_request("meetup references unknown presentations").with_details(
                json!({
                    "field": "presentations",
                    "code": "unknown_presentation",
                    "unknown": unknown,
                }),
            ),
        )
    }

    async fn save_details(
        &self,
        caller: &Caller,
        id: EntityId,
        details: MeetupDetails,
        deadline: &Deadline,
    ) -> Result<Stored<Meetup>, Error> {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut current = self.get(id, deadline).await?;
            authorize(&current.value.owner, caller)?;
            current.value.details = details.clone();
            match deadline.run(self.meetups.save(&current)).await? {
                Ok(saved) => return Ok(saved),
                Err(EntityStoreError::RevisionMismatch { .. }) => {
                    debug!(meetup_id = %id, attempt, "meetup changed during update; retrying");
                }
                Err(other) => return Err(map_store_error("meetup.save", other)),
            }
        }
        Err(Error::conflict("meetup is being modified concurrently; try again"))
    }
}

#[cfg(test)]
#[path = "meetup_service_tests.rs"]
mod tests;
