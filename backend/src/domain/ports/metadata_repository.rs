//! Port for the flat metadata key/value store.
//!
//! Metadata is not versioned: writes are last-write-wins.

use async_trait::async_trait;

use crate::domain::MetadataKey;

use super::EntityStoreError;

/// Port for metadata storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Fetch the value stored under `key`; `None` when unset.
    async fn get(&self, key: &MetadataKey) -> Result<Option<String>, EntityStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &MetadataKey, value: &str) -> Result<(), EntityStoreError>;

    /// Remove `key`; [`EntityStoreError::Missing`] when unset.
    async fn delete(&self, key: &MetadataKey) -> Result<(), EntityStoreError>;
}
