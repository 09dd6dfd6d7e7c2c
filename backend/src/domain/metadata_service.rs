//! Admin-only access to metadata entries.

use std::sync::Arc;

use tracing::info;

use super::ports::MetadataRepository;
use super::store_access::store_call;
use super::{Caller, Deadline, Error, MetadataKey};

#[derive(Clone)]
pub struct MetadataService {
    metadata: Arc<dyn MetadataRepository>,
}

impl MetadataService {
    pub fn new(metadata: Arc<dyn MetadataRepository>) -> Self {
        Self { metadata }
    }

    pub async fn get(
        &self,
        caller: &Caller,
        key: &MetadataKey,
        deadline: &Deadline,
    ) -> Result<String, Error> {
        caller.require_admin()?;
        store_call(deadline, "metadata.get", self.metadata.get(key))
            .await?
            .ok_or_else(|| Error::not_found(format!("metadata key {key} is not set")))
    }

    /// Last write wins.
    pub async fn put(
        &self,
        caller: &Caller,
        key: &MetadataKey,
        value: &str,
        deadline: &Deadline,
    ) -> Result<(), Error> {
        caller.require_admin()?;
        store_call(deadline, "metadata.put", self.metadata.put(key, value)).await?;
        // Values may be secrets; log the key only.
        info!(key = %key, caller = %caller.identity(), "metadata updated");
        Ok(())
    }

    pub async fn delete(
        &self,
        caller: &Caller,
        key: &MetadataKey,
        deadline: &Deadline,
    ) -> Result<(), Error> {
        caller.require_admin()?;
        store_call(deadline, "metadata.delete", self.metadata.delete(key)).await?;
        info!(key = %key, caller = %caller.identity(), "metadata deleted");
        Ok(())
    }
}
