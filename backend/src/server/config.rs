//! HTTP server settings and the runtime configuration built from them.
//!
//! [`ServerSettings`] is layered by OrthoConfig from CLI flags, `MEETUP_*`
//! environment variables and an optional config file. [`ServerConfig`] is the
//! validated form the server is built from.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use actix_web::http::header::HeaderName;
use meetup_backend::domain::{DEFAULT_OPERATION_BUDGET, MAX_OPERATION_BUDGET, UserIdentity};
use meetup_backend::inbound::http::identity::{DEFAULT_IDENTITY_HEADER, IdentityConfig};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_EVENTS_API_URL: &str = "https://api.meetup.com";
const DEFAULT_EVENTS_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings read at startup.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEETUP")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// Header the authentication proxy puts the user identity in.
    pub identity_header: Option<String>,
    /// Comma-separated identities holding the admin role.
    pub admins: Option<String>,
    /// Budget for one request, in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Base URL of the external events service.
    pub events_api_url: Option<String>,
    /// Timeout for one events service call, in milliseconds.
    pub events_api_timeout_ms: Option<u64>,
}

/// Invalid startup settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid identity header {value:?}: {message}")]
    IdentityHeader { value: String, message: String },
    #[error("invalid admin identity {value:?}: {message}")]
    Admin { value: String, message: String },
    #[error("invalid events api url {value:?}: {message}")]
    EventsApiUrl { value: String, message: String },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("{field} must not exceed {max_ms} ms")]
    DurationTooLong { field: &'static str, max_ms: u128 },
}

impl From<ConfigError> for std::io::Error {
    fn from(err: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    }
}

impl ServerSettings {
    fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    fn identity_header(&self) -> Result<HeaderName, ConfigError> {
        let raw = self
            .identity_header
            .as_deref()
            .unwrap_or(DEFAULT_IDENTITY_HEADER);
        HeaderName::from_bytes(raw.trim().as_bytes()).map_err(|err| ConfigError::IdentityHeader {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    fn admins(&self) -> Result<BTreeSet<UserIdentity>, ConfigError> {
        self.admins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                UserIdentity::new(entry).map_err(|err| ConfigError::Admin {
                    value: entry.to_owned(),
                    message: err.to_string(),
                })
            })
            .collect()
    }

    fn operation_budget(&self) -> Result<Duration, ConfigError> {
        millis_or(self.deadline_ms, DEFAULT_OPERATION_BUDGET, "deadline_ms")
    }

    fn events_api_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .events_api_url
            .as_deref()
            .unwrap_or(DEFAULT_EVENTS_API_URL);
        Url::parse(raw).map_err(|err| ConfigError::EventsApiUrl {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    fn events_api_timeout(&self) -> Result<Duration, ConfigError> {
        millis_or(
            self.events_api_timeout_ms,
            DEFAULT_EVENTS_API_TIMEOUT,
            "events_api_timeout_ms",
        )
    }
}

fn millis_or(
    value: Option<u64>,
    default: Duration,
    field: &'static str,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(0) => Err(ConfigError::ZeroDuration { field }),
        Some(ms) if Duration::from_millis(ms) > MAX_OPERATION_BUDGET => {
            Err(ConfigError::DurationTooLong {
                field,
                max_ms: MAX_OPERATION_BUDGET.as_millis(),
            })
        }
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

/// Validated configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) identity: IdentityConfig,
    pub(crate) operation_budget: Duration,
    pub(crate) events_api_url: Url,
    pub(crate) events_api_timeout: Duration,
}

impl ServerConfig {
    /// Validate `settings`, applying defaults for anything unset.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: settings.bind_addr(),
            identity: IdentityConfig::new(settings.identity_header()?, settings.admins()?),
            operation_budget: settings.operation_budget()?,
            events_api_url: settings.events_api_url()?,
            events_api_timeout: settings.events_api_timeout()?,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
