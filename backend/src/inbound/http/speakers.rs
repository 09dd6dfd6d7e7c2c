//! Speaker profile HTTP handlers.
//!
//! ```text
//! GET    /api/v1/speaker
//! POST   /api/v1/speaker
//! GET    /api/v1/speaker/find?name=&surname=&email=
//! GET    /api/v1/speaker/{id}
//! PUT    /api/v1/speaker/{id}
//! DELETE /api/v1/speaker/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Error, Speaker, SpeakerFilter, SpeakerProfile, Stored};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::responses::{CreatedResponse, created, deleted};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_entity_id, require_field};

const SPEAKER_ID: FieldName = FieldName::new("id");

/// Request payload for creating or replacing a speaker profile.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub about: Option<String>,
    pub company: Option<String>,
}

fn parse_speaker_request(payload: SpeakerRequest) -> Result<SpeakerProfile, Error> {
    Ok(SpeakerProfile {
        name: require_field(payload.name, FieldName::new("name"))?,
        surname: require_field(payload.surname, FieldName::new("surname"))?,
        email: require_field(payload.email, FieldName::new("email"))?,
        about: payload.about.unwrap_or_default(),
        company: payload.company.unwrap_or_default(),
    })
}

/// Speaker profile as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerResponse {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub about: String,
    pub company: String,
    pub owner: String,
}

impl From<Stored<Speaker>> for SpeakerResponse {
    fn from(stored: Stored<Speaker>) -> Self {
        let Speaker { owner, profile } = stored.value;
        Self {
            id: stored.id.get(),
            name: profile.name,
            surname: profile.surname,
            email: profile.email,
            about: profile.about,
            company: profile.company,
            owner: owner.into(),
        }
    }
}

/// Query parameters for `GET /speaker/find`. Every supplied field must match.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SpeakerQuery {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
}

impl From<SpeakerQuery> for SpeakerFilter {
    fn from(query: SpeakerQuery) -> Self {
        Self {
            name: query.name,
            surname: query.surname,
            email: query.email,
        }
    }
}

/// List every speaker.
#[utoipa::path(
    get,
    path = "/api/v1/speaker",
    responses(
        (status = 200, description = "Speakers in id order", body = [SpeakerResponse]),
        (status = 503, description = "Store did not answer in time", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "listSpeakers",
    security([])
)]
#[get("/speaker")]
pub async fn list_speakers(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<SpeakerResponse>>> {
    let speakers = state.speakers.list(&state.deadline()).await?;
    Ok(web::Json(speakers.into_iter().map(SpeakerResponse::from).collect()))
}

/// Create a speaker owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/speaker",
    request_body = SpeakerRequest,
    responses(
        (status = 201, description = "Speaker created", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "createSpeaker"
)]
#[post("/speaker")]
pub async fn create_speaker(
    state: web::Data<HttpState>,
    context: CallerContext,
    payload: web::Json<SpeakerRequest>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let profile = parse_speaker_request(payload.into_inner())?;
    let stored = state
        .speakers
        .create(caller, profile, &state.deadline())
        .await?;
    Ok(created(stored.id))
}

/// Find the first speaker matching the query.
#[utoipa::path(
    get,
    path = "/api/v1/speaker/find",
    params(SpeakerQuery),
    responses(
        (status = 200, description = "First matching speaker", body = SpeakerResponse),
        (status = 404, description = "No speaker matches", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "findSpeaker",
    security([])
)]
#[get("/speaker/find")]
pub async fn find_speaker(
    state: web::Data<HttpState>,
    query: web::Query<SpeakerQuery>,
) -> ApiResult<web::Json<SpeakerResponse>> {
    let filter = SpeakerFilter::from(query.into_inner());
    let found = state.speakers.find(&filter, &state.deadline()).await?;
    Ok(web::Json(found.into()))
}

/// Fetch one speaker.
#[utoipa::path(
    get,
    path = "/api/v1/speaker/{id}",
    params(("id" = i64, Path, description = "Speaker id")),
    responses(
        (status = 200, description = "Speaker", body = SpeakerResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "getSpeaker",
    security([])
)]
#[get("/speaker/{id}")]
pub async fn get_speaker(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<SpeakerResponse>> {
    let id = parse_entity_id(&path, SPEAKER_ID)?;
    let speaker = state.speakers.get(id, &state.deadline()).await?;
    Ok(web::Json(speaker.into()))
}

/// Replace a speaker profile. Owner or admin only.
#[utoipa::path(
    put,
    path = "/api/v1/speaker/{id}",
    params(("id" = i64, Path, description = "Speaker id")),
    request_body = SpeakerRequest,
    responses(
        (status = 200, description = "Updated speaker", body = SpeakerResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "updateSpeaker"
)]
#[put("/speaker/{id}")]
pub async fn update_speaker(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
    payload: web::Json<SpeakerRequest>,
) -> ApiResult<web::Json<SpeakerResponse>> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, SPEAKER_ID)?;
    let profile = parse_speaker_request(payload.into_inner())?;
    let saved = state
        .speakers
        .update(caller, id, profile, &state.deadline())
        .await?;
    Ok(web::Json(saved.into()))
}

/// Delete a speaker. Owner or admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/speaker/{id}",
    params(("id" = i64, Path, description = "Speaker id")),
    responses(
        (status = 204, description = "Speaker deleted"),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["speakers"],
    operation_id = "deleteSpeaker"
)]
#[delete("/speaker/{id}")]
pub async fn delete_speaker(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, SPEAKER_ID)?;
    state.speakers.delete(caller, id, &state.deadline()).await?;
    Ok(deleted())
}
