//! Talk proposals and their voter sets.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::validation::require_non_blank;
use super::{EntityId, Error, UserIdentity};

/// Presentation as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    /// Identity of the user who proposed the talk.
    pub owner: UserIdentity,
    /// Editable fields.
    pub details: PresentationDetails,
    /// Users who upvoted the talk.
    #[serde(default)]
    pub voters: VoterSet,
}

/// Editable fields of a presentation.
///
/// ## Invariants
/// - `title` and `description` are non-blank once validated.
/// - `speakers` holds at least one id, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PresentationDetails {
    pub title: String,
    pub description: String,
    pub speakers: Vec<EntityId>,
}

impl PresentationDetails {
    /// Check mandatory fields and normalise the speaker list.
    pub fn validate(mut self) -> Result<Self, Error> {
        require_non_blank("title", &self.title)?;
        require_non_blank("description", &self.description)?;
        let mut seen = Vec::with_capacity(self.speakers.len());
        self.speakers.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        if self.speakers.is_empty() {
            return Err(
                Error::invalid_request("at least one speaker is required").with_details(json!({
                    "field": "speakers",
                    "code": "missing_field",
                })),
            );
        }
        Ok(self)
    }
}

/// Deduplicated collection of user identities who upvoted a presentation.
///
/// Insertion order is kept for stable serialisation, but membership is the
/// only contract: an identity appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<UserIdentity>", into = "Vec<UserIdentity>")]
pub struct VoterSet(Vec<UserIdentity>);

impl VoterSet {
    /// Empty voter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `voter` has already voted.
    #[must_use]
    pub fn contains(&self, voter: &UserIdentity) -> bool {
        self.0.contains(voter)
    }

    /// Add `voter`; returns `false` when already present.
    pub fn insert(&mut self, voter: UserIdentity) -> bool {
        if self.contains(&voter) {
            return false;
        }
        self.0.push(voter);
        true
    }

    /// Remove `voter` by value; returns `false` when absent.
    pub fn remove(&mut self, voter: &UserIdentity) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != voter);
        self.0.len() != before
    }

    /// Number of distinct voters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody has voted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate voters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &UserIdentity> {
        self.0.iter()
    }
}

impl From<Vec<UserIdentity>> for VoterSet {
    fn from(value: Vec<UserIdentity>) -> Self {
        let mut set = Self::new();
        for voter in value {
            set.insert(voter);
        }
        set
    }
}

impl From<VoterSet> for Vec<UserIdentity> {
    fn from(value: VoterSet) -> Self {
        value.0
    }
}

/// Single-field equality filter over presentations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub speaker: Option<EntityId>,
}

impl PresentationFilter {
    /// Whether `details` satisfies every populated criterion.
    #[must_use]
    pub fn matches(&self, details: &PresentationDetails) -> bool {
        self.title.as_ref().is_none_or(|title| *title == details.title)
            && self
                .description
                .as_ref()
                .is_none_or(|description| *description == details.description)
            && self
                .speaker
                .is_none_or(|speaker| details.speakers.contains(&speaker))
    }
}

/// Listing view that exposes the vote count but never the voters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationPublicView {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub speakers: Vec<String>,
    pub votes: usize,
}
