//! Driven port supplying the events service credentials to the sync engine.
//!
//! The engine never reads ambient process state for its runtime settings; a
//! [`SyncSettingsSource`] is injected at construction instead.

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

/// Events service API key. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Reveal the key for the outbound request.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// URL name of the events service group meetups are published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupName(String);

impl GroupName {
    /// Wrap a raw group name.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the events API adapter needs to address one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCredentials {
    pub api_key: ApiKey,
    pub group: GroupName,
}

define_port_error! {
    /// Errors raised while resolving sync settings.
    pub enum SyncSettingsError {
        /// The setting is absent or blank.
        Missing { key: String } =>
            "sync setting {key} is not configured",
        /// The backing store failed.
        Store { message: String } =>
            "sync settings lookup failed: {message}",
    }
}

/// Port for reading sync settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncSettingsSource: Send + Sync {
    /// Events service API key.
    async fn api_key(&self) -> Result<ApiKey, SyncSettingsError>;

    /// Group the meetups are published to.
    async fn group_name(&self) -> Result<GroupName, SyncSettingsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("s3cret");
        assert_eq!(format!("{key:?}"), "ApiKey(<redacted>)");
        assert_eq!(key.expose(), "s3cret");
    }

    #[test]
    fn missing_setting_names_the_key() {
        let err = SyncSettingsError::missing("MEETUP_API_KEY");
        assert_eq!(err.to_string(), "sync setting MEETUP_API_KEY is not configured");
    }
}
