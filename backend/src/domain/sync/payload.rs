//! Meetup to event payload mapping.

use crate::domain::MeetupDetails;
use crate::domain::ports::{EventPayload, EventVisibility};

/// Build the event payload for `details`.
///
/// Time is milliseconds since the Unix epoch, the venue falls back to the
/// fixed default, and visibility is always members-only.
#[must_use]
pub fn event_payload(details: &MeetupDetails) -> EventPayload {
    let venue = details.venue_or_default();
    EventPayload {
        name: details.title.clone(),
        description: details.description.clone(),
        time_ms: details.date.timestamp_millis(),
        latitude: venue.latitude,
        longitude: venue.longitude,
        visibility: EventVisibility::Members,
    }
}
