//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::HeaderName;
use actix_web::{App, test, web};
use chrono::{DateTime, Utc};
use mockable::MockClock;

use crate::Trace;
use crate::domain::ports::{EventsApi, FixtureEventsApi, MetadataRepository};
use crate::domain::{MetadataKey, UserIdentity};
use crate::inbound::http::configure_api;
use crate::inbound::http::identity::{DEFAULT_IDENTITY_HEADER, IdentityConfig};
use crate::inbound::http::state::{HttpState, HttpStateServices};
use crate::outbound::memory::InMemoryStore;

/// Identity header the test app reads.
pub const USER_HEADER: &str = DEFAULT_IDENTITY_HEADER;
/// The only admin identity the test app knows.
pub const ADMIN: &str = "root@example.com";

/// Instant the test clock reports; meetups must be dated after it.
pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .expect("fixture timestamp")
        .with_timezone(&Utc)
}

/// REST surface over a fresh in-memory store with a frozen clock.
pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    state: HttpState,
    identity: IdentityConfig,
}

impl TestApp {
    /// App publishing through [`FixtureEventsApi`].
    pub fn new() -> Self {
        Self::with_events(Arc::new(FixtureEventsApi::default()))
    }

    pub fn with_events(events: Arc<dyn EventsApi>) -> Self {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(test_now());
        let store = Arc::new(InMemoryStore::new());
        let services = HttpStateServices::from_store(Arc::clone(&store), events, Arc::new(clock));
        let admin = UserIdentity::new(ADMIN).expect("valid admin identity");
        Self {
            store,
            state: HttpState::new(services),
            identity: IdentityConfig::new(HeaderName::from_static(USER_HEADER), [admin]),
        }
    }

    /// Store the events service credentials the sync engine needs.
    pub async fn configure_sync(&self) {
        self.store
            .put(&MetadataKey::api_key(), "test-key")
            .await
            .expect("store api key");
        self.store
            .put(&MetadataKey::group_name(), "rust-warsaw")
            .await
            .expect("store group name");
    }

    pub async fn service(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(web::Data::new(self.identity.clone()))
                .wrap(Trace)
                .service(web::scope("/api/v1").configure(configure_api)),
        )
        .await
    }
}
