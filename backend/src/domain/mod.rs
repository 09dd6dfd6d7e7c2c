//! Domain primitives, ports and services.
//!
//! Purpose: define the meetup entities, the vote ledger and the sync engine
//! independently of HTTP and storage. Adapters depend on this module, never
//! the other way round.
//!
//! Public surface:
//! - Entities: [`Speaker`], [`Presentation`], [`Meetup`], stored inside a
//!   [`Stored`] envelope carrying an [`EntityId`] and a [`Revision`].
//! - Identity: [`UserIdentity`], [`Caller`] and the [`authorize`] check.
//! - Services: [`SpeakerService`], [`PresentationService`], [`VoteLedger`],
//!   [`MeetupService`], [`MetadataService`], [`sync::SyncEngine`].
//! - Errors: [`Error`] with a stable [`ErrorCode`].

pub mod deadline;
pub mod entity;
pub mod error;
pub mod identity;
pub mod meetup;
pub mod meetup_service;
pub mod metadata;
pub mod metadata_service;
pub mod ports;
pub mod presentation;
pub mod presentation_service;
pub mod speaker;
pub mod speaker_service;
pub(crate) mod store_access;
pub mod sync;
pub mod trace_id;
pub(crate) mod validation;
pub mod vote_ledger;

pub use self::deadline::{
    DEFAULT_OPERATION_BUDGET, Deadline, DeadlineExceeded, MAX_OPERATION_BUDGET,
};
pub use self::entity::{EntityId, Revision, Stored};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{Caller, UserIdentity, UserIdentityValidationError, authorize};
pub use self::meetup::{
    DEFAULT_VENUE, EmptyExternalEventId, ExternalEventId, Meetup, MeetupDetails, SyncState, Venue,
};
pub use self::meetup_service::{MeetupChange, MeetupService};
pub use self::metadata::{
    MEETUP_API_KEY, MEETUP_GROUP_NAME, MetadataKey, MetadataKeyValidationError,
};
pub use self::metadata_service::MetadataService;
pub use self::presentation::{
    Presentation, PresentationDetails, PresentationFilter, PresentationPublicView, VoterSet,
};
pub use self::presentation_service::PresentationService;
pub use self::speaker::{Speaker, SpeakerFilter, SpeakerProfile};
pub use self::speaker_service::SpeakerService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::vote_ledger::{DownvoteOutcome, UpvoteOutcome, VoteLedger};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use meetup_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::unauthorized("admin role required"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
