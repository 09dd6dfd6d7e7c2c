//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every handler in the inbound HTTP layer plus the health probes
//! - **Schemas**: request and response DTOs, and the wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]) that describe domain errors
//!   without coupling domain types to utoipa
//! - **Security**: the identity header set by the authentication proxy
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::identity::DEFAULT_IDENTITY_HEADER;
use crate::inbound::http::meetups::{
    MeetupCreatedResponse, MeetupRequest, MeetupResponse, MeetupUpdatedResponse, SyncReportResponse,
    SyncStatus, SyncStatusKind, VenueDto,
};
use crate::inbound::http::metadata::{MetadataEntry, MetadataValue};
use crate::inbound::http::presentations::{
    HasVotedResponse, PresentationRequest, PresentationResponse, PresentationSummary, VoteOutcome,
    VoteResponse,
};
use crate::inbound::http::responses::CreatedResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::speakers::{SpeakerRequest, SpeakerResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the identity header security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "IdentityHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                DEFAULT_IDENTITY_HEADER,
                "Authenticated user identity, set by the fronting proxy.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Meetup backend API",
        description = "Speakers, presentations with voting, and meetups published to an external events service.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("IdentityHeader" = [])),
    paths(
        crate::inbound::http::speakers::list_speakers,
        crate::inbound::http::speakers::create_speaker,
        crate::inbound::http::speakers::find_speaker,
        crate::inbound::http::speakers::get_speaker,
        crate::inbound::http::speakers::update_speaker,
        crate::inbound::http::speakers::delete_speaker,
        crate::inbound::http::presentations::list_presentations,
        crate::inbound::http::presentations::create_presentation,
        crate::inbound::http::presentations::find_presentation,
        crate::inbound::http::presentations::get_presentation,
        crate::inbound::http::presentations::update_presentation,
        crate::inbound::http::presentations::delete_presentation,
        crate::inbound::http::presentations::upvote,
        crate::inbound::http::presentations::downvote,
        crate::inbound::http::presentations::has_upvoted,
        crate::inbound::http::meetups::list_meetups,
        crate::inbound::http::meetups::create_meetup,
        crate::inbound::http::meetups::sync_meetups,
        crate::inbound::http::meetups::get_meetup,
        crate::inbound::http::meetups::update_meetup,
        crate::inbound::http::meetups::delete_meetup,
        crate::inbound::http::meetups::delete_meetup_via_get,
        crate::inbound::http::metadata::get_metadata,
        crate::inbound::http::metadata::put_metadata,
        crate::inbound::http::metadata::delete_metadata,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CreatedResponse,
        SpeakerRequest,
        SpeakerResponse,
        PresentationRequest,
        PresentationResponse,
        PresentationSummary,
        VoteOutcome,
        VoteResponse,
        HasVotedResponse,
        MeetupRequest,
        MeetupResponse,
        MeetupCreatedResponse,
        MeetupUpdatedResponse,
        VenueDto,
        SyncStatus,
        SyncStatusKind,
        SyncReportResponse,
        MetadataEntry,
        MetadataValue,
    )),
    tags(
        (name = "speakers", description = "Speaker profiles"),
        (name = "presentations", description = "Talk proposals"),
        (name = "votes", description = "One vote per user per presentation"),
        (name = "meetups", description = "Meetups and their events service sync"),
        (name = "metadata", description = "Admin-only settings"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
