//! Meetup events and their synchronisation state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use super::validation::require_non_blank;
use super::{EntityId, Error, UserIdentity};

/// Venue used when a meetup does not specify coordinates.
pub const DEFAULT_VENUE: Venue = Venue {
    latitude: 52.229_676,
    longitude: 21.012_229,
};

/// Meetup as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meetup {
    /// Identity of the user who created the meetup.
    pub owner: UserIdentity,
    /// Editable fields.
    pub details: MeetupDetails,
    /// Identifier assigned by the external events service, once synced.
    #[serde(default)]
    pub external_id: Option<ExternalEventId>,
}

impl Meetup {
    /// Where this meetup sits in the sync lifecycle.
    #[must_use]
    pub fn sync_state(&self) -> SyncState<'_> {
        match &self.external_id {
            Some(id) => SyncState::Synced(id),
            None => SyncState::LocalOnly,
        }
    }
}

/// Persisted sync lifecycle of a meetup. The transient `Pending-*` phases
/// exist only inside a running sync operation and are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState<'a> {
    /// Never pushed to the events service.
    LocalOnly,
    /// Known to the events service under this identifier.
    Synced(&'a ExternalEventId),
}

/// Editable fields of a meetup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupDetails {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub vote_end: DateTime<Utc>,
    #[serde(default)]
    pub presentations: Vec<EntityId>,
    #[serde(default)]
    pub venue: Option<Venue>,
}

impl MeetupDetails {
    /// Check fields required on every write.
    pub fn validate(&self) -> Result<(), Error> {
        require_non_blank("title", &self.title)?;
        require_non_blank("description", &self.description)?;
        if let Some(venue) = self.venue {
            venue.validate()?;
        }
        Ok(())
    }

    /// Check fields required when the meetup is first created: both the
    /// meetup date and the voting deadline must lie strictly in the future.
    pub fn validate_for_creation(&self, now: DateTime<Utc>) -> Result<(), Error> {
        self.validate()?;
        require_future("date", self.date, now)?;
        require_future("voteEnd", self.vote_end, now)?;
        Ok(())
    }

    /// Venue to advertise, falling back to [`DEFAULT_VENUE`].
    #[must_use]
    pub fn venue_or_default(&self) -> Venue {
        self.venue.unwrap_or(DEFAULT_VENUE)
    }
}

fn require_future(
    field: &'static str,
    value: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if value > now {
        return Ok(());
    }
    Err(
        Error::invalid_request(format!("{field} must be in the future")).with_details(json!({
            "field": field,
            "value": value.to_rfc3339(),
            "code": "not_in_future",
        })),
    )
}

/// WGS84 venue coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub latitude: f64,
    pub longitude: f64,
}

impl Venue {
    fn validate(self) -> Result<(), Error> {
        let in_range = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);
        if in_range {
            return Ok(());
        }
        Err(Error::invalid_request("venue coordinates are out of range")
            .with_details(json!({ "field": "venue", "code": "invalid_coordinates" })))
    }
}

/// Identifier assigned by the external events service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalEventId(String);

/// Validation error for [`ExternalEventId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("external event identifier must not be empty")]
pub struct EmptyExternalEventId;

impl ExternalEventId {
    /// Wrap a non-empty identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyExternalEventId> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(EmptyExternalEventId);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExternalEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ExternalEventId {
    type Error = EmptyExternalEventId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExternalEventId> for String {
    fn from(value: ExternalEventId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .expect("fixture timestamp")
            .with_timezone(&Utc)
    }

    fn details(now: DateTime<Utc>) -> MeetupDetails {
        MeetupDetails {
            title: "Rust Warsaw #42".to_owned(),
            description: "Talks and pizza".to_owned(),
            date: now + TimeDelta::days(14),
            vote_end: now + TimeDelta::days(7),
            presentations: Vec::new(),
            venue: None,
        }
    }

    #[rstest]
    fn future_dates_are_accepted(now: DateTime<Utc>) {
        assert!(details(now).validate_for_creation(now).is_ok());
    }

    #[rstest]
    #[case::date_now(TimeDelta::zero(), TimeDelta::days(1))]
    #[case::date_past(-TimeDelta::hours(1), TimeDelta::days(1))]
    #[case::vote_end_now(TimeDelta::days(1), TimeDelta::zero())]
    fn non_future_dates_are_rejected(
        now: DateTime<Utc>,
        #[case] date_offset: TimeDelta,
        #[case] vote_end_offset: TimeDelta,
    ) {
        let mut meetup = details(now);
        meetup.date = now + date_offset;
        meetup.vote_end = now + vote_end_offset;
        let err = meetup
            .validate_for_creation(now)
            .expect_err("dates must be in the future");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn venue_defaults_to_fixed_location(now: DateTime<Utc>) {
        assert_eq!(details(now).venue_or_default(), DEFAULT_VENUE);
    }

    #[rstest]
    fn out_of_range_venue_is_rejected(now: DateTime<Utc>) {
        let mut meetup = details(now);
        meetup.venue = Some(Venue {
            latitude: 91.0,
            longitude: 0.0,
        });
        assert!(meetup.validate().is_err());
    }

    #[rstest]
    fn sync_state_follows_external_id(now: DateTime<Utc>) {
        let mut meetup = Meetup {
            owner: UserIdentity::new("owner@example.com").expect("valid"),
            details: details(now),
            external_id: None,
        };
        assert_eq!(meetup.sync_state(), SyncState::LocalOnly);

        let id = ExternalEventId::new("E1").expect("valid id");
        meetup.external_id = Some(id.clone());
        assert_eq!(meetup.sync_state(), SyncState::Synced(&id));
    }

    #[rstest]
    fn external_ids_must_not_be_blank() {
        assert_eq!(ExternalEventId::new(" "), Err(EmptyExternalEventId));
    }
}
