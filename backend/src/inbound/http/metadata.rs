//! Admin-only metadata HTTP handlers.
//!
//! Metadata holds the events service credentials (`MEETUP_API_KEY`,
//! `MEETUP_GROUP_NAME`) alongside any other flat settings.

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::responses::deleted;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_metadata_key;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetadataEntry {
    #[schema(example = "MEETUP_GROUP_NAME")]
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetadataValue {
    pub value: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/metadata/{key}",
    params(("key" = String, Path, description = "Metadata key")),
    responses(
        (status = 200, description = "Stored value", body = MetadataEntry),
        (status = 401, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Key not set", body = ErrorSchema)
    ),
    tags = ["metadata"],
    operation_id = "getMetadata"
)]
#[get("/metadata/{key}")]
pub async fn get_metadata(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MetadataEntry>> {
    let caller = context.require_caller()?;
    let key = parse_metadata_key(path.into_inner())?;
    let value = state.metadata.get(caller, &key, &state.deadline()).await?;
    Ok(web::Json(MetadataEntry {
        key: key.as_str().to_owned(),
        value,
    }))
}

/// Set a value. Last write wins.
#[utoipa::path(
    put,
    path = "/api/v1/metadata/{key}",
    params(("key" = String, Path, description = "Metadata key")),
    request_body = MetadataValue,
    responses(
        (status = 204, description = "Value stored"),
        (status = 400, description = "Malformed key", body = ErrorSchema),
        (status = 401, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["metadata"],
    operation_id = "putMetadata"
)]
#[put("/metadata/{key}")]
pub async fn put_metadata(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
    payload: web::Json<MetadataValue>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let key = parse_metadata_key(path.into_inner())?;
    state
        .metadata
        .put(caller, &key, &payload.value, &state.deadline())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/v1/metadata/{key}",
    params(("key" = String, Path, description = "Metadata key")),
    responses(
        (status = 204, description = "Value removed"),
        (status = 401, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["metadata"],
    operation_id = "deleteMetadata"
)]
#[delete("/metadata/{key}")]
pub async fn delete_metadata(
    state: web::Data<HttpState>,
    context: CallerContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = context.require_caller()?;
    let key = parse_metadata_key(path.into_inner())?;
    state
        .metadata
        .delete(caller, &key, &state.deadline())
        .await?;
    Ok(deleted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{ADMIN, TestApp, USER_HEADER};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::anonymous(None)]
    #[case::regular_user(Some("ada@example.com"))]
    #[actix_web::test]
    async fn non_admins_are_refused(#[case] user: Option<&str>) {
        let app = TestApp::new();
        let service = app.service().await;
        let mut req = test::TestRequest::get().uri("/api/v1/metadata/MEETUP_API_KEY");
        if let Some(user) = user {
            req = req.insert_header((USER_HEADER, user));
        }

        let res = test::call_service(&service, req.to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn admin_put_get_delete_cycle() {
        let app = TestApp::new();
        let service = app.service().await;

        let res = test::call_service(
            &service,
            test::TestRequest::put()
                .uri("/api/v1/metadata/THEME")
                .insert_header((USER_HEADER, ADMIN))
                .set_json(json!({"value": "dark"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let entry: MetadataEntry = test::call_and_read_body_json(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/metadata/THEME")
                .insert_header((USER_HEADER, ADMIN))
                .to_request(),
        )
        .await;
        assert_eq!(entry.key, "THEME");
        assert_eq!(entry.value, "dark");

        let res = test::call_service(
            &service,
            test::TestRequest::delete()
                .uri("/api/v1/metadata/THEME")
                .insert_header((USER_HEADER, ADMIN))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = test::call_service(
            &service,
            test::TestRequest::get()
                .uri("/api/v1/metadata/THEME")
                .insert_header((USER_HEADER, ADMIN))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
