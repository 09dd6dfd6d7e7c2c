//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod entity_store;
mod events_api;
mod metadata_repository;
mod sync_settings;

#[cfg(test)]
pub use entity_store::{MockMeetupRepository, MockPresentationRepository, MockSpeakerRepository};
pub use entity_store::{
    EntityStoreError, MeetupRepository, PresentationRepository, SpeakerRepository,
};
#[cfg(test)]
pub use events_api::MockEventsApi;
pub use events_api::{EventPayload, EventVisibility, EventsApi, EventsApiError, FixtureEventsApi};
#[cfg(test)]
pub use metadata_repository::MockMetadataRepository;
pub use metadata_repository::MetadataRepository;
#[cfg(test)]
pub use sync_settings::MockSyncSettingsSource;
pub use sync_settings::{
    ApiKey, GroupName, SyncCredentials, SyncSettingsError, SyncSettingsSource,
};
