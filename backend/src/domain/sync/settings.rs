//! Sync settings read from the metadata store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::MetadataKey;
use crate::domain::ports::{
    ApiKey, GroupName, MetadataRepository, SyncSettingsError, SyncSettingsSource,
};

/// [`SyncSettingsSource`] backed by the `MEETUP_API_KEY` and
/// `MEETUP_GROUP_NAME` metadata entries. Values are read on every call so
/// admin edits take effect on the next sync.
#[derive(Clone)]
pub struct MetadataSyncSettings {
    metadata: Arc<dyn MetadataRepository>,
}

impl MetadataSyncSettings {
    pub fn new(metadata: Arc<dyn MetadataRepository>) -> Self {
        Self { metadata }
    }

    async fn required(&self, key: MetadataKey) -> Result<String, SyncSettingsError> {
        let value = self
            .metadata
            .get(&key)
            .await
            .map_err(|err| SyncSettingsError::store(err.to_string()))?;
        match value {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(SyncSettingsError::missing(key.as_str())),
        }
    }
}

#[async_trait]
impl SyncSettingsSource for MetadataSyncSettings {
    async fn api_key(&self) -> Result<ApiKey, SyncSettingsError> {
        self.required(MetadataKey::api_key()).await.map(ApiKey::new)
    }

    async fn group_name(&self) -> Result<GroupName, SyncSettingsError> {
        self.required(MetadataKey::group_name())
            .await
            .map(GroupName::new)
    }
}
