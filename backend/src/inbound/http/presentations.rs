//! Presentation and voting HTTP handlers.
//!
//! ```text
//! GET    /api/v1/presentation[?speaker=]
//! POST   /api/v1/presentation
//! GET    /api/v1/presentation/find?title=&description=&speaker=
//! GET    /api/v1/presentation/{id}
//! PUT    /api/v1/presentation/{id}
//! DELETE /api/v1/presentation/{id}
//! GET    /api/v1/presentation/{id}/upvote
//! GET    /api/v1/presentation/{id}/downvote
//! GET    /api/v1/presentation/{id}/hasUpvoted
//! ```
//!
//! Listings return the public view, which carries a vote count but never the
//! voters themselves.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    DownvoteOutcome, EntityId, Error, Presentation, PresentationDetails, PresentationFilter,
    PresentationPublicView, Stored, UpvoteOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::responses::{CreatedResponse, created, deleted};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_entity_id, require_field};

const PRESENTATION_ID: FieldName = FieldName::new("id");
const SPEAKER: FieldName = FieldName::new("speaker");

/// Request payload for creating or replacing a presentation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Ids of existing speakers; at least one is required.
    #[schema(value_type = Option<Vec<i64>>)]
    pub speakers: Option<Vec<EntityId>>,
}

fn parse_presentation_request(payload: PresentationRequest) -> Result<PresentationDetails, Error> {
    Ok(PresentationDetails {
        title: require_field(payload.title, FieldName::new("title"))?,
        description: require_field(payload.description, FieldName::new("description"))?,
        speakers: require_field(payload.speakers, FieldName::new("speakers"))?,
    })
}

/// Full presentation as returned by `GET /presentation/{id}`.
///
/// Exposes the vote count; the voter identities stay server side.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub speakers: Vec<i64>,
    pub votes: usize,
    pub owner: String,
}

impl From<Stored<Presentation>> for PresentationResponse {
    fn from(stored: Stored<Presentation>) -> Self {
        let Presentation {
            owner,
            details,
            voters,
        } = stored.value;
        Self {
            id: stored.id.get(),
            title: details.title,
            description: details.description,
            speakers: details.speakers.into_iter().map(EntityId::get).collect(),
            votes: voters.len(),
            owner: owner.into(),
        }
    }
}

/// Listing entry with speaker names resolved.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentationSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Full names of the speakers that still exist.
    pub speakers: Vec<String>,
    pub votes: usize,
}

impl From<PresentationPublicView> for PresentationSummary {
    fn from(view: PresentationPublicView) -> Self {
        Self {
            id: view.id.get(),
            title: view.title,
            description: view.description,
            speakers: view.speakers,
            votes: view.votes,
        }
    }
}

/// Query parameters shared by the listing and `find` endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PresentationQuery {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Speaker id the presentation must list.
    pub speaker: Option<String>,
}

impl TryFrom<PresentationQuery> for PresentationFilter {
    type Error = Error;

    fn try_from(query: PresentationQuery) -> Result<Self, Self::Error> {
        let speaker = query
            .speaker
            .as_deref()
            .map(|raw| parse_entity_id(raw, SPEAKER))
            .transpose()?;
        Ok(Self {
            title: query.title,
            description: query.description,
            speaker,
        })
    }
}

/// Outcome of a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    Recorded,
    AlreadyVoted,
    Removed,
    NotVoted,
}

/// Body returned by the vote endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub message: String,
}

impl From<UpvoteOutcome> for VoteResponse {
    fn from(outcome: UpvoteOutcome) -> Self {
        let kind = match outcome {
            UpvoteOutcome::Recorded => VoteOutcome::Recorded,
            UpvoteOutcome::AlreadyVoted => VoteOutcome::AlreadyVoted,
        };
        Self {
            outcome: kind,
            message: outcome.message().to_owned(),
        }
    }
}

impl From<DownvoteOutcome> for VoteResponse {
    fn from(outcome: DownvoteOutcome) -> Self {
        let kind = match outcome {
            DownvoteOutcome::Removed => VoteOutcome::Removed,
            DownvoteOutcome::NotVoted => VoteOutcome::NotVoted,
        };
        Self {
            outcome: kind,
            message: outcome.message().to_owned(),
        }
    }
}

/// Body returned by `hasUpvoted`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HasVotedResponse {
    pub voted: bool,
}

/// List presentations, optionally restricted to one speaker.
#[utoipa::path(
    get,
    path = "/api/v1/presentation",
    params(PresentationQuery),
    responses(
        (status = 200, description = "Public presentation views", body = [PresentationSummary]),
        (status = 400, description = "Malformed speaker id", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "listPresentations",
    security([])
)]
#[get("/presentation")]
pub async fn list_presentations(
    state: web::Data<HttpState>,
    query: web::Query<PresentationQuery>,
) -> ApiResult<web::Json<Vec<PresentationSummary>>> {
    let filter = PresentationFilter::try_from(query.into_inner())?;
    let views = state
        .presentations
        .public_views(&filter, &state.deadline())
        .await?;
    Ok(web::Json(
        views.into_iter().map(PresentationSummary::from).collect(),
    ))
}

/// Create a presentation owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/presentation",
    request_body = PresentationRequest,
    responses(
        (status = 201, description = "Presentation created", body = CreatedResponse),
        (status = 400, description = "Invalid request or unknown speaker", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "createPresentation"
)]
#[post("/presentation")]
pub async fn create_presentation(
    state: web::Data<HttpState>,
    context: CallerContext,
    payload: web::Json<PresentationRequest>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let details = parse_presentation_request(payload.into_inner())?;
    let stored = state
        .presentations
        .create(caller, details, &state.deadline())
        .await?;
    Ok(created(stored.id))
}

/// Find the first presentation matching the query.
#[utoipa::path(
    get,
    path = "/api/v1/presentation/find",
    params(PresentationQuery),
    responses(
        (status = 200, description = "First matching presentation", body = PresentationResponse),
        (status = 404, description = "No presentation matches", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "findPresentation",
    security([])
)]
#[get("/presentation/find")]
pub async fn find_presentation(
    state: web::Data<HttpState>,
    query: web::Query<PresentationQuery>,
) -> ApiResult<web::Json<PresentationResponse>> {
    let filter = PresentationFilter::try_from(query.into_inner())?;
    let found = state.presentations.find(&filter, &state.deadline()).await?;
    Ok(web::Json(found.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/presentation/{id}",
    params(("id" = i64, Path, description = "Presentation id")),
    responses(
        (status = 200, description = "Presentation", body = PresentationResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "getPresentation",
    security([])
)]
#[get("/presentation/{id}")]
pub async fn get_presentation(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PresentationResponse>> {
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    let found = state.presentations.get(id, &state.deadline()).await?;
    Ok(web::Json(found.into()))
}

/// Replace title, description and speakers. Votes and owner are kept.
#[utoipa::path(
    put,
    path = "/api/v1/presentation/{id}",
    params(("id" = i64, Path, description = "Presentation id")),
    request_body = PresentationRequest,
    responses(
        (status = 200, description = "Updated presentation", body = PresentationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent writers kept winning", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "updatePresentation"
)]
#[put("/presentation/{id}")]
pub async fn update_presentation(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
    payload: web::Json<PresentationRequest>,
) -> ApiResult<web::Json<PresentationResponse>> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    let details = parse_presentation_request(payload.into_inner())?;
    let saved = state
        .presentations
        .update(caller, id, details, &state.deadline())
        .await?;
    Ok(web::Json(saved.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/presentation/{id}",
    params(("id" = i64, Path, description = "Presentation id")),
    responses(
        (status = 204, description = "Presentation deleted"),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["presentations"],
    operation_id = "deletePresentation"
)]
#[delete("/presentation/{id}")]
pub async fn delete_presentation(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    state
        .presentations
        .delete(caller, id, &state.deadline())
        .await?;
    Ok(deleted())
}

/// Record the caller's vote. Voting twice is reported, not counted.
#[utoipa::path(
    get,
    path = "/api/v1/presentation/{id}/upvote",
    params(("id" = i64, Path, description = "Presentation id")),
    responses(
        (status = 200, description = "Vote outcome", body = VoteResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Vote retries exhausted", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "upvotePresentation"
)]
#[get("/presentation/{id}/upvote")]
pub async fn upvote(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<VoteResponse>> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    let outcome = state
        .votes
        .upvote(id, caller.identity(), &state.deadline())
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Withdraw the caller's vote.
#[utoipa::path(
    get,
    path = "/api/v1/presentation/{id}/downvote",
    params(("id" = i64, Path, description = "Presentation id")),
    responses(
        (status = 200, description = "Vote outcome", body = VoteResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Vote retries exhausted", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "downvotePresentation"
)]
#[get("/presentation/{id}/downvote")]
pub async fn downvote(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<VoteResponse>> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    let outcome = state
        .votes
        .downvote(id, caller.identity(), &state.deadline())
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Whether the caller has voted. Anonymous callers never have.
#[utoipa::path(
    get,
    path = "/api/v1/presentation/{id}/hasUpvoted",
    params(("id" = i64, Path, description = "Presentation id")),
    responses(
        (status = 200, description = "Vote state", body = HasVotedResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "hasUpvoted",
    security([])
)]
#[get("/presentation/{id}/hasUpvoted")]
pub async fn has_upvoted(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<HasVotedResponse>> {
    let id = parse_entity_id(&path, PRESENTATION_ID)?;
    let voter = context.caller().map(|caller| caller.identity());
    let voted = state
        .votes
        .has_voted(id, voter, &state.deadline())
        .await?;
    Ok(web::Json(HasVotedResponse { voted }))
}
