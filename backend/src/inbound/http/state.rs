//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;

use crate::domain::ports::{
    EventsApi, MeetupRepository, MetadataRepository, PresentationRepository, SpeakerRepository,
};
use crate::domain::sync::{MetadataSyncSettings, SyncEngine};
use crate::domain::{
    DEFAULT_OPERATION_BUDGET, Deadline, MeetupService, MetadataService, PresentationService,
    SpeakerService, VoteLedger,
};

/// Parameter object bundling every domain service the handlers call.
#[derive(Clone)]
pub struct HttpStateServices {
    pub speakers: SpeakerService,
    pub presentations: PresentationService,
    pub votes: VoteLedger,
    pub meetups: MeetupService,
    pub metadata: MetadataService,
}

impl HttpStateServices {
    /// Wire every service over one store implementing all repository ports.
    ///
    /// Sync settings are read from the same store's metadata entries.
    pub fn from_store<S>(store: Arc<S>, events: Arc<dyn EventsApi>, clock: Arc<dyn Clock>) -> Self
    where
        S: SpeakerRepository
            + PresentationRepository
            + MeetupRepository
            + MetadataRepository
            + 'static,
    {
        let speakers: Arc<dyn SpeakerRepository> = store.clone();
        let presentations: Arc<dyn PresentationRepository> = store.clone();
        let meetups: Arc<dyn MeetupRepository> = store.clone();
        let metadata: Arc<dyn MetadataRepository> = store;
        let sync = SyncEngine::new(
            Arc::new(MetadataSyncSettings::new(Arc::clone(&metadata))),
            Arc::clone(&meetups),
            events,
        );
        Self {
            speakers: SpeakerService::new(Arc::clone(&speakers)),
            presentations: PresentationService::new(Arc::clone(&presentations), speakers),
            votes: VoteLedger::new(Arc::clone(&presentations)),
            meetups: MeetupService::new(meetups, presentations, sync, clock),
            metadata: MetadataService::new(metadata),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub speakers: SpeakerService,
    pub presentations: PresentationService,
    pub votes: VoteLedger,
    pub meetups: MeetupService,
    pub metadata: MetadataService,
    operation_budget: Duration,
}

impl HttpState {
    /// Construct state using the default per-request budget.
    pub fn new(services: HttpStateServices) -> Self {
        Self::with_operation_budget(services, DEFAULT_OPERATION_BUDGET)
    }

    /// Construct state with an explicit per-request budget.
    pub fn with_operation_budget(services: HttpStateServices, operation_budget: Duration) -> Self {
        let HttpStateServices {
            speakers,
            presentations,
            votes,
            meetups,
            metadata,
        } = services;
        Self {
            speakers,
            presentations,
            votes,
            meetups,
            metadata,
            operation_budget,
        }
    }

    /// Fresh deadline for one request.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.operation_budget)
    }

    /// Budget each request's deadline is derived from.
    pub fn operation_budget(&self) -> Duration {
        self.operation_budget
    }
}
