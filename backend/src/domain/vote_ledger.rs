//! Per-presentation voter membership.
//!
//! Votes are a read-modify-write of the presentation's [`VoterSet`]. The
//! store only offers single-key compare-and-swap, so every mutation runs in a
//! retry loop: read, apply, save with the observed revision, and start over
//! when another writer got there first. Every lost race means another vote
//! landed, so the loop always makes progress; it is bounded by the operation
//! [`Deadline`] rather than an attempt count. Two users voting at once
//! therefore both land, and the same user voting twice at once lands exactly
//! once because the losing attempt re-reads a set that already contains them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ports::{EntityStoreError, PresentationRepository};
use super::store_access::{map_store_error, not_found, store_call};
use super::{Deadline, DeadlineExceeded, EntityId, Error, UserIdentity, VoterSet};

/// Result of an upvote. Both variants are successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpvoteOutcome {
    /// The caller's vote was added.
    Recorded,
    /// The caller had already voted; nothing changed.
    AlreadyVoted,
}

impl UpvoteOutcome {
    /// Message shown to the voter.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Recorded => "Thanks for your vote!",
            Self::AlreadyVoted => "You have already voted for this presentation.",
        }
    }
}

/// Result of a downvote. Both variants are successful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownvoteOutcome {
    /// The caller's vote was withdrawn.
    Removed,
    /// The caller had not voted; nothing changed.
    NotVoted,
}

impl DownvoteOutcome {
    /// Message shown to the voter.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Removed => "Your vote has been withdrawn.",
            Self::NotVoted => "You have not voted for this presentation.",
        }
    }
}

/// Vote ledger over the presentation repository.
#[derive(Clone)]
pub struct VoteLedger {
    presentations: Arc<dyn PresentationRepository>,
    max_attempts: Option<usize>,
}

impl VoteLedger {
    /// Ledger that retries lost races until the operation deadline.
    pub fn new(presentations: Arc<dyn PresentationRepository>) -> Self {
        Self {
            presentations,
            max_attempts: None,
        }
    }

    /// Additionally cap compare-and-swap attempts; exhausting the cap yields
    /// `Conflict`. Values below one are treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Add `voter` to the presentation's voter set.
    ///
    /// Any authenticated identity may vote; there is no ownership check.
    pub async fn upvote(
        &self,
        presentation_id: EntityId,
        voter: &UserIdentity,
        deadline: &Deadline,
    ) -> Result<UpvoteOutcome, Error> {
        let outcome = self
            .mutate(presentation_id, deadline, |voters| {
                if voters.insert(voter.clone()) {
                    (true, UpvoteOutcome::Recorded)
                } else {
                    (false, UpvoteOutcome::AlreadyVoted)
                }
            })
            .await?;
        info!(presentation_id = %presentation_id, voter = %voter, ?outcome, "upvote processed");
        Ok(outcome)
    }

    /// Remove `voter` from the presentation's voter set.
    pub async fn downvote(
        &self,
        presentation_id: EntityId,
        voter: &UserIdentity,
        deadline: &Deadline,
    ) -> Result<DownvoteOutcome, Error> {
        let outcome = self
            .mutate(presentation_id, deadline, |voters| {
                if voters.remove(voter) {
                    (true, DownvoteOutcome::Removed)
                } else {
                    (false, DownvoteOutcome::NotVoted)
                }
            })
            .await?;
        info!(presentation_id = %presentation_id, voter = %voter, ?outcome, "downvote processed");
        Ok(outcome)
    }

    /// Whether `voter` has voted. Anonymous callers have never voted.
    pub async fn has_voted(
        &self,
        presentation_id: EntityId,
        voter: Option<&UserIdentity>,
        deadline: &Deadline,
    ) -> Result<bool, Error> {
        let Some(voter) = voter else {
            return Ok(false);
        };
        let presentation = store_call(
            deadline,
            "presentation.get",
            self.presentations.get(presentation_id),
        )
        .await?
        .ok_or_else(|| not_found("presentation", presentation_id))?;
        Ok(presentation.value.voters.contains(voter))
    }

    /// CAS loop shared by upvote and downvote. `apply` reports whether it
    /// changed the set; unchanged sets are not written back.
    async fn mutate<O, A>(
        &self,
        presentation_id: EntityId,
        deadline: &Deadline,
        mut apply: A,
    ) -> Result<O, Error>
    where
        A: FnMut(&mut VoterSet) -> (bool, O),
    {
        let mut attempt: usize = 0;
        loop {
            attempt += 1;
            let mut current = store_call(
                deadline,
                "presentation.get",
                self.presentations.get(presentation_id),
            )
            .await?
            .ok_or_else(|| not_found("presentation", presentation_id))?;

            let (changed, outcome) = apply(&mut current.value.voters);
            if !changed {
                return Ok(outcome);
            }

            match deadline.run(self.presentations.save(&current)).await? {
                Ok(_) => return Ok(outcome),
                Err(EntityStoreError::RevisionMismatch { expected, actual }) => {
                    debug!(
                        presentation_id = %presentation_id,
                        attempt,
                        expected,
                        actual,
                        "voter set changed concurrently; retrying"
                    );
                }
                Err(EntityStoreError::Missing { .. }) => {
                    return Err(not_found("presentation", presentation_id));
                }
                Err(other) => return Err(map_store_error("presentation.save", other)),
            }

            if self.max_attempts.is_some_and(|cap| attempt >= cap) {
                warn!(
                    presentation_id = %presentation_id,
                    attempts = attempt,
                    "vote abandoned after repeated concurrent modifications"
                );
                return Err(Error::conflict(
                    "presentation is being modified concurrently; try again",
                ));
            }
            if deadline.is_expired() {
                warn!(
                    presentation_id = %presentation_id,
                    attempts = attempt,
                    "vote ran out of budget under concurrent modifications"
                );
                return Err(DeadlineExceeded.into());
            }
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
#[path = "vote_ledger_tests.rs"]
mod tests;
