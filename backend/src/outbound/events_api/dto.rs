//! Wire shapes exchanged with the events service.
//!
//! Requests are form encoded; responses are JSON. The service has returned
//! event ids both as strings and as bare numbers, so both are accepted.

use serde::Deserialize;

use crate::domain::ExternalEventId;
use crate::domain::ports::{ApiKey, EventPayload};

#[derive(Debug, Deserialize)]
pub(super) struct EventResponseDto {
    pub(super) id: EventIdDto,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum EventIdDto {
    Text(String),
    Number(u64),
}

impl EventResponseDto {
    pub(super) fn into_external_id(self) -> Result<ExternalEventId, String> {
        let raw = match self.id {
            EventIdDto::Text(text) => text,
            EventIdDto::Number(number) => number.to_string(),
        };
        ExternalEventId::new(raw).map_err(|error| error.to_string())
    }
}

/// Form fields for create and update calls, in the order the service
/// documents them.
pub(super) fn event_form(payload: &EventPayload, key: &ApiKey) -> Vec<(&'static str, String)> {
    vec![
        ("name", payload.name.clone()),
        ("description", payload.description.clone()),
        ("time", payload.time_ms.to_string()),
        ("lat", payload.latitude.to_string()),
        ("lon", payload.longitude.to_string()),
        ("venue_visibility", payload.visibility.as_str().to_owned()),
        ("sign", "true".to_owned()),
        ("key", key.expose().to_owned()),
    ]
}
