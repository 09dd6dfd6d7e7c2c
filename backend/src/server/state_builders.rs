//! Builders for the HTTP state and the adapters behind it.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use meetup_backend::domain::ports::EventsApi;
use meetup_backend::inbound::http::state::{HttpState, HttpStateServices};
use meetup_backend::outbound::events_api::EventsHttpClient;
use meetup_backend::outbound::memory::InMemoryStore;

use super::ServerConfig;

/// Build the events service client from configuration.
///
/// # Errors
/// Returns [`std::io::Error`] when the HTTP client cannot be constructed.
fn build_events_api(config: &ServerConfig) -> std::io::Result<Arc<dyn EventsApi>> {
    let client = EventsHttpClient::new(config.events_api_url.clone(), config.events_api_timeout)
        .map_err(|err| std::io::Error::other(format!("events api client setup failed: {err}")))?;
    info!(base_url = %config.events_api_url, "events api client configured");
    Ok(Arc::new(client))
}

/// Build the shared HTTP state over the in-memory store.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let store = Arc::new(InMemoryStore::new());
    let events = build_events_api(config)?;
    let services = HttpStateServices::from_store(store, events, Arc::new(DefaultClock));
    Ok(web::Data::new(HttpState::with_operation_budget(
        services,
        config.operation_budget,
    )))
}
