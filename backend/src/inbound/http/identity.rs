//! Caller identity supplied by the fronting authentication proxy.
//!
//! The proxy authenticates the user and forwards the identity in a trusted
//! header (default `X-Authenticated-User`). Handlers never see the header:
//! they take a [`CallerContext`] and ask it for a [`Caller`].

use std::collections::HashSet;

use actix_web::http::header::HeaderName;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::{debug, warn};

use crate::domain::{Caller, Error, UserIdentity};

/// Default header carrying the authenticated user identity.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-user";

/// How to turn request headers into a caller.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    header: HeaderName,
    admins: HashSet<UserIdentity>,
}

impl IdentityConfig {
    /// Read identities from `header`; members of `admins` get the admin role.
    pub fn new(header: HeaderName, admins: impl IntoIterator<Item = UserIdentity>) -> Self {
        Self {
            header,
            admins: admins.into_iter().collect(),
        }
    }

    /// Header name identities are read from.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    fn caller_from(&self, req: &HttpRequest) -> Option<Caller> {
        let raw = req.headers().get(&self.header)?;
        let raw = match raw.to_str() {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, header = %self.header, "identity header is not visible ASCII");
                return None;
            }
        };
        let identity = match UserIdentity::new(raw.trim()) {
            Ok(identity) => identity,
            Err(error) => {
                debug!(%error, "blank identity header treated as anonymous");
                return None;
            }
        };
        Some(if self.admins.contains(&identity) {
            Caller::admin(identity)
        } else {
            Caller::user(identity)
        })
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_IDENTITY_HEADER), [])
    }
}

/// The caller of the current request, if the proxy identified one.
#[derive(Debug, Clone)]
pub struct CallerContext(Option<Caller>);

impl CallerContext {
    /// Caller, when the request carries an identity.
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }

    /// Require an identified caller or return `401 Unauthorized`.
    pub fn require_caller(&self) -> Result<&Caller, Error> {
        self.caller()
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for CallerContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = match req.app_data::<web::Data<IdentityConfig>>() {
            Some(config) => config.caller_from(req),
            None => IdentityConfig::default().caller_from(req),
        };
        ready(Ok(Self(caller)))
    }
}
