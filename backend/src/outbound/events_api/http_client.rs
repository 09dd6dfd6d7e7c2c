//! Reqwest-backed events service adapter.
//!
//! This adapter owns transport details only: URL construction, form
//! encoding, timeout and HTTP error mapping, and decoding the assigned event
//! id. It never retries; the sync engine decides what a failure means.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};

use super::dto::{EventResponseDto, event_form};
use crate::domain::ExternalEventId;
use crate::domain::ports::{EventPayload, EventsApi, EventsApiError, SyncCredentials};

const DEFAULT_USER_AGENT: &str = "meetup-backend-sync/0.1";

/// Events service adapter addressing `{base}/{group}/events`.
pub struct EventsHttpClient {
    client: Client,
    base: Url,
}

impl EventsHttpClient {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let client = EventsHttpClient::new(base, Duration::from_secs(2));
    /// assert!(client.is_ok() || client.is_err());
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, base })
    }

    fn events_url(
        &self,
        credentials: &SyncCredentials,
        event_id: Option<&ExternalEventId>,
    ) -> Result<Url, EventsApiError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                EventsApiError::transport(format!("base url {} cannot carry a path", self.base))
            })?;
            segments.pop_if_empty();
            segments.push(credentials.group.as_str());
            segments.push("events");
            if let Some(event_id) = event_id {
                segments.push(event_id.as_str());
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        credentials: &SyncCredentials,
        payload: &EventPayload,
    ) -> Result<Vec<u8>, EventsApiError> {
        let response = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&event_form(payload, &credentials.api_key))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl EventsApi for EventsHttpClient {
    async fn create_event(
        &self,
        credentials: &SyncCredentials,
        payload: &EventPayload,
    ) -> Result<ExternalEventId, EventsApiError> {
        let url = self.events_url(credentials, None)?;
        let body = self.send(Method::POST, url, credentials, payload).await?;
        parse_event_id(&body)
    }

    async fn update_event(
        &self,
        credentials: &SyncCredentials,
        event_id: &ExternalEventId,
        payload: &EventPayload,
    ) -> Result<(), EventsApiError> {
        let url = self.events_url(credentials, Some(event_id))?;
        self.send(Method::PATCH, url, credentials, payload).await?;
        Ok(())
    }
}

fn parse_event_id(body: &[u8]) -> Result<ExternalEventId, EventsApiError> {
    let decoded: EventResponseDto = serde_json::from_slice(body).map_err(|error| {
        EventsApiError::decode(format!("invalid events JSON payload: {error}"))
    })?;
    decoded.into_external_id().map_err(EventsApiError::decode)
}

fn map_transport_error(error: reqwest::Error) -> EventsApiError {
    if error.is_timeout() {
        EventsApiError::timeout(error.to_string())
    } else {
        EventsApiError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> EventsApiError {
    let body_preview = body_preview(body);
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            EventsApiError::timeout(format!("status {}", status.as_u16()))
        }
        _ => EventsApiError::rejected(status.as_u16(), body_preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
