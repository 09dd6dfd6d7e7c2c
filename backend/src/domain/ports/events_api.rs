//! Driven port for publishing meetups to the external events service.
//!
//! The domain owns the payload shape; adapters own the wire encoding.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::domain::ExternalEventId;

use super::{SyncCredentials, define_port_error};

/// Who may see the venue of a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventVisibility {
    /// Group members only. The only visibility this service publishes with.
    #[default]
    Members,
}

impl EventVisibility {
    /// Wire value expected by the events service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
        }
    }
}

/// Event fields pushed on create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    /// Meetup title.
    pub name: String,
    /// Meetup description.
    pub description: String,
    /// Event start in milliseconds since the Unix epoch.
    pub time_ms: i64,
    /// Venue latitude in WGS84.
    pub latitude: f64,
    /// Venue longitude in WGS84.
    pub longitude: f64,
    /// Venue visibility.
    pub visibility: EventVisibility,
}

define_port_error! {
    /// Errors surfaced while calling the events service.
    pub enum EventsApiError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "events api transport failed: {message}",
        /// The call exceeded the client timeout.
        Timeout { message: String } =>
            "events api timeout: {message}",
        /// The service answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "events api rejected request with status {status}: {message}",
        /// The response could not be decoded.
        Decode { message: String } =>
            "events api response decode failed: {message}",
    }
}

/// Port for the external events service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventsApi: Send + Sync {
    /// Publish a new event and return the identifier the service assigned.
    async fn create_event(
        &self,
        credentials: &SyncCredentials,
        payload: &EventPayload,
    ) -> Result<ExternalEventId, EventsApiError>;

    /// Overwrite an already published event.
    async fn update_event(
        &self,
        credentials: &SyncCredentials,
        event_id: &ExternalEventId,
        payload: &EventPayload,
    ) -> Result<(), EventsApiError>;
}

/// Fixture implementation that accepts every call and hands out sequential
/// identifiers (`fixture-1`, `fixture-2`, ...).
#[derive(Debug, Default)]
pub struct FixtureEventsApi {
    issued: AtomicU64,
}

#[async_trait]
impl EventsApi for FixtureEventsApi {
    async fn create_event(
        &self,
        _credentials: &SyncCredentials,
        _payload: &EventPayload,
    ) -> Result<ExternalEventId, EventsApiError> {
        let next = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        ExternalEventId::new(format!("fixture-{next}"))
            .map_err(|err| EventsApiError::decode(err.to_string()))
    }

    async fn update_event(
        &self,
        _credentials: &SyncCredentials,
        _event_id: &ExternalEventId,
        _payload: &EventPayload,
    ) -> Result<(), EventsApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ApiKey, GroupName};

    fn credentials() -> SyncCredentials {
        SyncCredentials {
            api_key: ApiKey::new("K1"),
            group: GroupName::new("G1"),
        }
    }

    fn payload() -> EventPayload {
        EventPayload {
            name: "T".to_owned(),
            description: "D".to_owned(),
            time_ms: 0,
            latitude: 0.0,
            longitude: 0.0,
            visibility: EventVisibility::Members,
        }
    }

    #[tokio::test]
    async fn fixture_issues_sequential_identifiers() {
        let api = FixtureEventsApi::default();
        let first = api
            .create_event(&credentials(), &payload())
            .await
            .expect("fixture create");
        let second = api
            .create_event(&credentials(), &payload())
            .await
            .expect("fixture create");
        assert_eq!(first.as_str(), "fixture-1");
        assert_eq!(second.as_str(), "fixture-2");
    }

    #[test]
    fn visibility_wire_value_is_members() {
        assert_eq!(EventVisibility::default().as_str(), "members");
    }

    #[test]
    fn rejected_error_carries_status() {
        let err = EventsApiError::rejected(502_u16, "bad gateway");
        assert_eq!(
            err.to_string(),
            "events api rejected request with status 502: bad gateway"
        );
    }
}
