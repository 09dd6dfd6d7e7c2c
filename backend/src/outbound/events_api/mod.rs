//! Events service outbound adapters.
//!
//! This module provides a reqwest implementation of the `EventsApi` port.

mod dto;
mod http_client;

pub use http_client::EventsHttpClient;
