//! Meetup HTTP handlers and the admin bulk-sync trigger.
//!
//! ```text
//! GET    /api/v1/meetup
//! POST   /api/v1/meetup
//! POST   /api/v1/meetup/sync
//! GET    /api/v1/meetup/{id}
//! PUT    /api/v1/meetup/{id}
//! DELETE /api/v1/meetup/{id}
//! GET    /api/v1/meetup/{id}/delete
//! ```
//!
//! Creating or editing a meetup commits locally before the events service is
//! called. The response reports the sync attempt separately, so a failed
//! publish still answers with the saved meetup and `sync.status = "failed"`.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::sync::{SyncError, SyncOutcome, SyncReport};
use crate::domain::{EntityId, Error, Meetup, MeetupDetails, Stored, Venue};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::responses::deleted;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_entity_id, parse_rfc3339_timestamp, require_field,
};

const MEETUP_ID: FieldName = FieldName::new("id");

/// WGS84 coordinates of the venue.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct VenueDto {
    #[schema(example = 52.2297)]
    pub latitude: f64,
    #[schema(example = 21.0122)]
    pub longitude: f64,
}

impl From<VenueDto> for Venue {
    fn from(dto: VenueDto) -> Self {
        Self {
            latitude: dto.latitude,
            longitude: dto.longitude,
        }
    }
}

impl From<Venue> for VenueDto {
    fn from(venue: Venue) -> Self {
        Self {
            latitude: venue.latitude,
            longitude: venue.longitude,
        }
    }
}

/// Request payload for creating or replacing a meetup.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetupRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 start time.
    #[schema(example = "2030-05-04T18:00:00Z")]
    pub date: Option<String>,
    /// RFC 3339 end of the presentation vote.
    #[schema(example = "2030-05-01T18:00:00Z")]
    pub vote_end: Option<String>,
    #[schema(value_type = Option<Vec<i64>>)]
    pub presentations: Option<Vec<EntityId>>,
    /// Omitted venues fall back to the group's default location.
    pub venue: Option<VenueDto>,
}

fn parse_meetup_request(payload: MeetupRequest) -> Result<MeetupDetails, Error> {
    let date = require_field(payload.date, FieldName::new("date"))?;
    let vote_end = require_field(payload.vote_end, FieldName::new("voteEnd"))?;
    Ok(MeetupDetails {
        title: require_field(payload.title, FieldName::new("title"))?,
        description: require_field(payload.description, FieldName::new("description"))?,
        date: parse_rfc3339_timestamp(date, FieldName::new("date"))?,
        vote_end: parse_rfc3339_timestamp(vote_end, FieldName::new("voteEnd"))?,
        presentations: payload.presentations.unwrap_or_default(),
        venue: payload.venue.map(Venue::from),
    })
}

/// Meetup as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeetupResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, format = DateTime)]
    pub date: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub vote_end: DateTime<Utc>,
    pub presentations: Vec<i64>,
    pub venue: Option<VenueDto>,
    pub owner: String,
    /// Identifier of the published event; absent until the first sync.
    pub external_id: Option<String>,
}

impl From<Stored<Meetup>> for MeetupResponse {
    fn from(stored: Stored<Meetup>) -> Self {
        let Meetup {
            owner,
            details,
            external_id,
        } = stored.value;
        Self {
            id: stored.id.get(),
            title: details.title,
            description: details.description,
            date: details.date,
            vote_end: details.vote_end,
            presentations: details.presentations.into_iter().map(EntityId::get).collect(),
            venue: details.venue.map(VenueDto::from),
            owner: owner.into(),
            external_id: external_id.map(String::from),
        }
    }
}

/// Result of the sync attempt that followed a local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatusKind {
    Created,
    Updated,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub status: SyncStatusKind,
    /// Set when the meetup was published by this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Why the sync failed; retry with `POST /meetup/sync` or another edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SyncStatus {
    fn of(kind: SyncStatusKind) -> Self {
        Self {
            status: kind,
            external_id: None,
            reason: None,
        }
    }
}

impl From<Result<SyncOutcome, SyncError>> for SyncStatus {
    fn from(result: Result<SyncOutcome, SyncError>) -> Self {
        match result {
            Ok(SyncOutcome::Created { external_id }) => Self {
                external_id: Some(external_id.into()),
                ..Self::of(SyncStatusKind::Created)
            },
            Ok(SyncOutcome::Updated) => Self::of(SyncStatusKind::Updated),
            Ok(SyncOutcome::Skipped) => Self::of(SyncStatusKind::Skipped),
            Err(err) => Self {
                reason: Some(err.to_string()),
                ..Self::of(SyncStatusKind::Failed)
            },
        }
    }
}

/// Body of `POST /meetup`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeetupCreatedResponse {
    pub id: i64,
    pub sync: SyncStatus,
}

/// Body of `PUT /meetup/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeetupUpdatedResponse {
    pub meetup: MeetupResponse,
    pub sync: SyncStatus,
}

/// Body of a fully successful bulk sync.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncReportResponse {
    /// Meetups whose published events were refreshed.
    pub updated: Vec<i64>,
    /// Meetups never published, left untouched.
    pub skipped: Vec<i64>,
}

impl From<SyncReport> for SyncReportResponse {
    fn from(report: SyncReport) -> Self {
        Self {
            updated: report.updated.into_iter().map(EntityId::get).collect(),
            skipped: report.skipped.into_iter().map(EntityId::get).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/meetup",
    responses(
        (status = 200, description = "Meetups in id order", body = [MeetupResponse])
    ),
    tags = ["meetups"],
    operation_id = "listMeetups",
    security([])
)]
#[get("/meetup")]
pub async fn list_meetups(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<MeetupResponse>>> {
    let meetups = state.meetups.list(&state.deadline()).await?;
    Ok(web::Json(meetups.into_iter().map(MeetupResponse::from).collect()))
}

/// Create a meetup and publish it to the events service.
#[utoipa::path(
    post,
    path = "/api/v1/meetup",
    request_body = MeetupRequest,
    responses(
        (status = 201, description = "Meetup saved; see `sync` for the publish result", body = MeetupCreatedResponse),
        (status = 400, description = "Invalid request or date in the past", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "createMeetup"
)]
#[post("/meetup")]
pub async fn create_meetup(
    state: web::Data<HttpState>,
    context: CallerContext,
    payload: web::Json<MeetupRequest>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let details = parse_meetup_request(payload.into_inner())?;
    let change = state
        .meetups
        .create(caller, details, &state.deadline())
        .await?;
    Ok(HttpResponse::Created().json(MeetupCreatedResponse {
        id: change.meetup.id.get(),
        sync: change.sync.into(),
    }))
}

/// Refresh every published meetup. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/meetup/sync",
    responses(
        (status = 200, description = "Every published meetup was refreshed", body = SyncReportResponse),
        (status = 401, description = "Admin role required", body = ErrorSchema),
        (status = 500, description = "Some meetups failed; see `details.failedMeetups`", body = ErrorSchema),
        (status = 503, description = "Deadline exceeded", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "syncMeetups"
)]
#[post("/meetup/sync")]
pub async fn sync_meetups(
    state: web::Data<HttpState>,
    context: CallerContext,
) -> ApiResult<web::Json<SyncReportResponse>> {
    let caller = context.require_caller()?;
    let report = state.meetups.sync_all(caller, &state.deadline()).await?;
    Ok(web::Json(report.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/meetup/{id}",
    params(("id" = i64, Path, description = "Meetup id")),
    responses(
        (status = 200, description = "Meetup", body = MeetupResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "getMeetup",
    security([])
)]
#[get("/meetup/{id}")]
pub async fn get_meetup(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<MeetupResponse>> {
    let id = parse_entity_id(&path, MEETUP_ID)?;
    let meetup = state.meetups.get(id, &state.deadline()).await?;
    Ok(web::Json(meetup.into()))
}

/// Replace a meetup and refresh its published event.
#[utoipa::path(
    put,
    path = "/api/v1/meetup/{id}",
    params(("id" = i64, Path, description = "Meetup id")),
    request_body = MeetupRequest,
    responses(
        (status = 200, description = "Meetup saved; see `sync` for the refresh result", body = MeetupUpdatedResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "updateMeetup"
)]
#[put("/meetup/{id}")]
pub async fn update_meetup(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
    payload: web::Json<MeetupRequest>,
) -> ApiResult<web::Json<MeetupUpdatedResponse>> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(&path, MEETUP_ID)?;
    let details = parse_meetup_request(payload.into_inner())?;
    let change = state
        .meetups
        .update(caller, id, details, &state.deadline())
        .await?;
    Ok(web::Json(MeetupUpdatedResponse {
        meetup: change.meetup.into(),
        sync: change.sync.into(),
    }))
}

async fn remove_meetup(
    state: &HttpState,
    context: &CallerContext,
    raw_id: &str,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let id = parse_entity_id(raw_id, MEETUP_ID)?;
    state.meetups.delete(caller, id, &state.deadline()).await?;
    Ok(deleted())
}

/// Delete a meetup. The published event is left on the events service.
#[utoipa::path(
    delete,
    path = "/api/v1/meetup/{id}",
    params(("id" = i64, Path, description = "Meetup id")),
    responses(
        (status = 204, description = "Meetup deleted"),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "deleteMeetup"
)]
#[delete("/meetup/{id}")]
pub async fn delete_meetup(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    remove_meetup(&state, &context, &path).await
}

/// Same as `DELETE /meetup/{id}`, kept for clients that can only issue GETs.
#[utoipa::path(
    get,
    path = "/api/v1/meetup/{id}/delete",
    params(("id" = i64, Path, description = "Meetup id")),
    responses(
        (status = 204, description = "Meetup deleted"),
        (status = 401, description = "Not the owner or an admin", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["meetups"],
    operation_id = "deleteMeetupViaGet"
)]
#[get("/meetup/{id}/delete")]
pub async fn delete_meetup_via_get(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    remove_meetup(&state, &context, &path).await
}

#[cfg(test)]
#[path = "meetups_tests.rs"]
mod tests;
