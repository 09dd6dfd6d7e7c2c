//! Response bodies shared by several resources.

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EntityId;

/// Body returned by `201 Created` responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// Store-assigned identifier of the new resource.
    #[schema(value_type = i64, example = 1)]
    pub id: EntityId,
}

pub(crate) fn created(id: EntityId) -> HttpResponse {
    HttpResponse::Created().json(CreatedResponse { id })
}

pub(crate) fn deleted() -> HttpResponse {
    HttpResponse::NoContent().finish()
}
