//! Deadline-bounded entity store calls and their mapping to domain errors.

use std::future::Future;

use serde_json::json;
use tracing::{error, warn};

use super::ports::EntityStoreError;
use super::{Deadline, EntityId, Error};

/// Run one store call under `deadline`, mapping failures to domain errors.
///
/// `operation` names the call in logs, e.g. `"meetup.get"`.
pub(crate) async fn store_call<T, F>(
    deadline: &Deadline,
    operation: &'static str,
    fut: F,
) -> Result<T, Error>
where
    F: Future<Output = Result<T, EntityStoreError>>,
{
    match deadline.run(fut).await {
        Ok(result) => result.map_err(|err| map_store_error(operation, err)),
        Err(exceeded) => {
            warn!(operation, "entity store call exceeded the operation deadline");
            Err(exceeded.into())
        }
    }
}

/// Translate a store failure, logging the ones callers cannot act on.
pub(crate) fn map_store_error(operation: &'static str, err: EntityStoreError) -> Error {
    let error_kind = err.kind();
    match err {
        EntityStoreError::Connection { message } => {
            error!(operation, error_kind, %message, "entity store unavailable");
            Error::service_unavailable("entity store unavailable")
        }
        EntityStoreError::Query { message } => {
            error!(operation, error_kind, %message, "entity store query failed");
            Error::internal(format!("entity store query failed: {message}"))
        }
        EntityStoreError::RevisionMismatch { expected, actual } => {
            Error::conflict("entity was modified concurrently").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
                "code": "revision_mismatch",
            }))
        }
        EntityStoreError::Missing { id } => Error::not_found(format!("entity {id} not found")),
    }
}

/// `NotFound` error for an entity kind and id.
pub(crate) fn not_found(kind: &'static str, id: EntityId) -> Error {
    Error::not_found(format!("{kind} {id} not found")).with_details(json!({
        "kind": kind,
        "id": id,
    }))
}
