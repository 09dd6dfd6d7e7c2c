//! One-way synchronisation of meetups to the external events service.
//!
//! Every entry point runs in two phases under one [`Deadline`]:
//!
//! 1. **Gather.** The API key, the group name and the meetup record(s) are
//!    read concurrently with `tokio::try_join!`. The first error wins and
//!    drops the sibling reads; nothing is sent upstream.
//! 2. **Publish.** `create_remote` and `update_one` make a single external
//!    call. `update_remote` spawns one task per synced meetup on a
//!    [`JoinSet`], drains every task, and aggregates the failures by meetup
//!    id instead of stopping at the first one.
//!
//! The only local write is the external id written back after a successful
//! create. It re-reads the meetup and saves with the revision just read, so a
//! concurrent edit is never overwritten.

mod error;
mod payload;
mod settings;

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    EntityStoreError, EventsApi, MeetupRepository, SyncCredentials, SyncSettingsSource,
};
use crate::domain::{Deadline, EntityId, ExternalEventId, Meetup, Stored, TraceId};

pub use self::error::{AggregateSyncError, BulkSyncError, SyncError, SyncOutcome, SyncReport};
pub use self::payload::event_payload;
pub use self::settings::MetadataSyncSettings;

/// Write-back attempts before giving up with [`SyncError::WriteBackConflict`].
pub const DEFAULT_WRITE_BACK_ATTEMPTS: usize = 5;

/// Pushes local meetup state to the events service.
#[derive(Clone)]
pub struct SyncEngine {
    settings: Arc<dyn SyncSettingsSource>,
    meetups: Arc<dyn MeetupRepository>,
    events: Arc<dyn EventsApi>,
    write_back_attempts: usize,
}

impl SyncEngine {
    /// Build an engine from its three collaborators.
    pub fn new(
        settings: Arc<dyn SyncSettingsSource>,
        meetups: Arc<dyn MeetupRepository>,
        events: Arc<dyn EventsApi>,
    ) -> Self {
        Self {
            settings,
            meetups,
            events,
            write_back_attempts: DEFAULT_WRITE_BACK_ATTEMPTS,
        }
    }

    /// Override the write-back retry bound. Values below one are treated as one.
    #[must_use]
    pub fn with_write_back_attempts(mut self, attempts: usize) -> Self {
        self.write_back_attempts = attempts.max(1);
        self
    }

    /// Publish a meetup that has never been synced and record the external
    /// id the service assigns.
    ///
    /// On any failure the meetup keeps its previous persisted state.
    pub async fn create_remote(
        &self,
        meetup_id: EntityId,
        deadline: &Deadline,
    ) -> Result<ExternalEventId, SyncError> {
        let (credentials, meetup) = self
            .gather(deadline, self.fetch_meetup(meetup_id))
            .await?;
        if let Some(external_id) = meetup.value.external_id {
            return Err(SyncError::AlreadySynced {
                meetup_id,
                external_id,
            });
        }

        let payload = event_payload(&meetup.value.details);
        let external_id = deadline
            .run(self.events.create_event(&credentials, &payload))
            .await??;
        debug!(meetup_id = %meetup_id, external_id = %external_id, "event created upstream");

        self.write_back(meetup_id, &external_id, deadline).await?;
        info!(meetup_id = %meetup_id, external_id = %external_id, "meetup synced");
        Ok(external_id)
    }

    /// Overwrite the published event of one meetup. Meetups that were never
    /// published are skipped.
    pub async fn update_one(
        &self,
        meetup_id: EntityId,
        deadline: &Deadline,
    ) -> Result<SyncOutcome, SyncError> {
        let (credentials, meetup) = self
            .gather(deadline, self.fetch_meetup(meetup_id))
            .await?;
        let Some(external_id) = meetup.value.external_id.as_ref() else {
            debug!(meetup_id = %meetup_id, "meetup never published; skipping update");
            return Ok(SyncOutcome::Skipped);
        };

        let payload = event_payload(&meetup.value.details);
        deadline
            .run(
                self.events
                    .update_event(&credentials, external_id, &payload),
            )
            .await??;
        info!(meetup_id = %meetup_id, external_id = %external_id, "meetup event updated");
        Ok(SyncOutcome::Updated)
    }

    /// Overwrite the published event of every synced meetup concurrently.
    ///
    /// Unsynced meetups are skipped. One failing meetup does not stop the
    /// others; the error lists every meetup that still needs a retry.
    pub async fn update_remote(&self, deadline: &Deadline) -> Result<SyncReport, BulkSyncError> {
        let list = async {
            self.meetups
                .list()
                .await
                .map_err(SyncError::from)
        };
        let (credentials, meetups) = self.gather(deadline, list).await?;
        let credentials = Arc::new(credentials);

        let mut report = SyncReport::default();
        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();
        for meetup in meetups {
            let Some(external_id) = meetup.value.external_id.clone() else {
                report.skipped.push(meetup.id);
                continue;
            };
            pending.insert(meetup.id);
            tasks.spawn(TraceId::propagate(update_task(
                Arc::clone(&self.events),
                Arc::clone(&credentials),
                meetup,
                external_id,
                *deadline,
            )));
        }

        let mut failures = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((meetup_id, Ok(()))) => {
                    pending.remove(&meetup_id);
                    report.updated.push(meetup_id);
                }
                Ok((meetup_id, Err(err))) => {
                    pending.remove(&meetup_id);
                    warn!(meetup_id = %meetup_id, error = %err, "meetup event update failed");
                    failures.insert(meetup_id, err);
                }
                Err(join_err) => {
                    error!(error = %join_err, "meetup sync task aborted");
                }
            }
        }
        // Only tasks that panicked or were cancelled are still pending.
        for meetup_id in pending {
            failures.insert(
                meetup_id,
                SyncError::TaskAborted("task ended without reporting".to_owned()),
            );
        }
        report.updated.sort_unstable();

        if failures.is_empty() {
            info!(
                updated = report.updated.len(),
                skipped = report.skipped.len(),
                "bulk meetup sync complete"
            );
            return Ok(report);
        }
        warn!(
            failed = failures.len(),
            updated = report.updated.len(),
            "bulk meetup sync finished with failures"
        );
        Err(AggregateSyncError { failures, report }.into())
    }

    /// Fail-fast fan-in of credentials and `target` under `deadline`.
    async fn gather<T, F>(
        &self,
        deadline: &Deadline,
        target: F,
    ) -> Result<(SyncCredentials, T), SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        let api_key = async { self.settings.api_key().await.map_err(SyncError::from) };
        let group = async { self.settings.group_name().await.map_err(SyncError::from) };
        let (api_key, group, target) = deadline
            .run(async { tokio::try_join!(api_key, group, target) })
            .await??;
        Ok((SyncCredentials { api_key, group }, target))
    }

    async fn fetch_meetup(&self, meetup_id: EntityId) -> Result<Stored<Meetup>, SyncError> {
        self.meetups
            .get(meetup_id)
            .await?
            .ok_or(SyncError::MeetupNotFound(meetup_id))
    }

    /// Record `external_id` on the latest revision of the meetup.
    async fn write_back(
        &self,
        meetup_id: EntityId,
        external_id: &ExternalEventId,
        deadline: &Deadline,
    ) -> Result<(), SyncError> {
        for attempt in 1..=self.write_back_attempts {
            let mut current = deadline.run(self.fetch_meetup(meetup_id)).await?.inspect_err(
                |err| {
                    warn!(
                        meetup_id = %meetup_id,
                        external_id = %external_id,
                        error = %err,
                        "event published but meetup could not be re-read"
                    );
                },
            )?;
            if let Some(existing) = &current.value.external_id {
                warn!(
                    meetup_id = %meetup_id,
                    existing = %existing,
                    orphaned = %external_id,
                    "meetup was synced concurrently; keeping the existing external id"
                );
                return Err(SyncError::AlreadySynced {
                    meetup_id,
                    external_id: existing.clone(),
                });
            }

            current.value.external_id = Some(external_id.clone());
            match deadline.run(self.meetups.save(&current)).await? {
                Ok(_) => return Ok(()),
                Err(EntityStoreError::RevisionMismatch { expected, actual }) => {
                    debug!(
                        meetup_id = %meetup_id,
                        attempt,
                        expected,
                        actual,
                        "meetup changed during write-back; retrying"
                    );
                }
                Err(EntityStoreError::Missing { .. }) => {
                    warn!(
                        meetup_id = %meetup_id,
                        orphaned = %external_id,
                        "meetup deleted before its external id was recorded"
                    );
                    return Err(SyncError::MeetupNotFound(meetup_id));
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(SyncError::WriteBackConflict(meetup_id))
    }
}

async fn update_task(
    events: Arc<dyn EventsApi>,
    credentials: Arc<SyncCredentials>,
    meetup: Stored<Meetup>,
    external_id: ExternalEventId,
    deadline: Deadline,
) -> (EntityId, Result<(), SyncError>) {
    let payload = event_payload(&meetup.value.details);
    let result = match deadline
        .run(events.update_event(&credentials, &external_id, &payload))
        .await
    {
        Ok(outcome) => outcome.map_err(SyncError::from),
        Err(exceeded) => Err(exceeded.into()),
    };
    (meetup.id, result)
}

#[cfg(test)]
mod tests;
