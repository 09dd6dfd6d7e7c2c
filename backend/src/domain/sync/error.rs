//! Sync failures, per meetup and in aggregate.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::ports::{EntityStoreError, EventsApiError, SyncSettingsError};
use crate::domain::store_access::map_store_error;
use crate::domain::{DeadlineExceeded, EntityId, Error, ExternalEventId};

/// Why one sync attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// API key or group name could not be resolved.
    #[error(transparent)]
    Settings(#[from] SyncSettingsError),
    /// Reading or writing the meetup failed.
    #[error(transparent)]
    Store(#[from] EntityStoreError),
    /// The events service call failed.
    #[error(transparent)]
    Upstream(#[from] EventsApiError),
    /// The meetup does not exist (or was deleted mid-sync).
    #[error("meetup {0} not found")]
    MeetupNotFound(EntityId),
    /// `create_remote` was asked to publish a meetup that already has an
    /// external identifier.
    #[error("meetup {meetup_id} is already synced as {external_id}")]
    AlreadySynced {
        meetup_id: EntityId,
        external_id: ExternalEventId,
    },
    /// The external id could not be written back before retries ran out.
    #[error("meetup {0} kept changing while its external id was written back")]
    WriteBackConflict(EntityId),
    /// The operation deadline expired.
    #[error("sync deadline exceeded")]
    DeadlineExceeded,
    /// The task driving this meetup's sync panicked or was cancelled.
    #[error("sync task aborted: {0}")]
    TaskAborted(String),
}

impl From<DeadlineExceeded> for SyncError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::DeadlineExceeded
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(store) => map_store_error("meetup.sync", store),
            SyncError::MeetupNotFound(id) => Error::not_found(format!("meetup {id} not found")),
            SyncError::AlreadySynced { .. } | SyncError::WriteBackConflict(_) => {
                Error::conflict(err.to_string())
            }
            SyncError::DeadlineExceeded => Error::service_unavailable(err.to_string()),
            SyncError::Settings(_) | SyncError::Upstream(_) | SyncError::TaskAborted(_) => {
                Error::sync_failed(err.to_string())
            }
        }
    }
}

/// Outcome of syncing one meetup after a local edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SyncOutcome {
    /// The meetup was published and now carries this external id.
    Created {
        #[serde(rename = "externalId")]
        external_id: ExternalEventId,
    },
    /// The published event was overwritten.
    Updated,
    /// The meetup was never published, so there was nothing to update.
    Skipped,
}

/// Successful bulk sync summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Meetups whose remote events were overwritten.
    pub updated: Vec<EntityId>,
    /// Meetups skipped because they were never published.
    pub skipped: Vec<EntityId>,
}

/// Bulk sync in which at least one meetup failed.
///
/// Meetups listed in `report.updated` did sync; their remote state is
/// current. Every meetup in `failures` needs another attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} meetup(s) failed to sync: {}", .failures.len(), failed_ids(.failures))]
pub struct AggregateSyncError {
    pub failures: BTreeMap<EntityId, SyncError>,
    pub report: SyncReport,
}

fn failed_ids(failures: &BTreeMap<EntityId, SyncError>) -> String {
    failures
        .keys()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AggregateSyncError> for Error {
    fn from(err: AggregateSyncError) -> Self {
        let failed: Vec<_> = err
            .failures
            .iter()
            .map(|(id, failure)| json!({ "id": id, "reason": failure.to_string() }))
            .collect();
        Error::sync_failed(err.to_string()).with_details(json!({
            "failedMeetups": failed,
            "updated": err.report.updated,
            "skipped": err.report.skipped,
        }))
    }
}

/// Failure of a bulk sync: either before any meetup was attempted, or after
/// fan-out with some meetups failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkSyncError {
    /// Inputs could not be gathered; nothing was sent.
    #[error(transparent)]
    Prepare(#[from] SyncError),
    /// Some meetups failed.
    #[error(transparent)]
    Partial(#[from] AggregateSyncError),
}

impl From<BulkSyncError> for Error {
    fn from(err: BulkSyncError) -> Self {
        match err {
            BulkSyncError::Prepare(inner) => inner.into(),
            BulkSyncError::Partial(inner) => inner.into(),
        }
    }
}
