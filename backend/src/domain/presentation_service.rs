//! Presentation use cases other than voting.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use serde_json::json;
use tracing::{debug, info, warn};

use super::ports::{EntityStoreError, PresentationRepository, SpeakerRepository};
use super::store_access::{map_store_error, not_found, store_call};
use super::{
    Caller, Deadline, EntityId, Error, Presentation, PresentationDetails, PresentationFilter,
    PresentationPublicView, Stored, VoterSet, authorize,
};

/// Attempts at applying an edit while votes keep landing.
const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Presentation CRUD and public listings.
#[derive(Clone)]
pub struct PresentationService {
    presentations: Arc<dyn PresentationRepository>,
    speakers: Arc<dyn SpeakerRepository>,
}

impl PresentationService {
    pub fn new(
        presentations: Arc<dyn PresentationRepository>,
        speakers: Arc<dyn SpeakerRepository>,
    ) -> Self {
        Self {
            presentations,
            speakers,
        }
    }

    /// Create a presentation owned by `caller` with an empty voter set.
    ///
    /// Every referenced speaker must exist.
    pub async fn create(
        &self,
        caller: &Caller,
        details: PresentationDetails,
        deadline: &Deadline,
    ) -> Result<Stored<Presentation>, Error> {
        let details = details.validate()?;
        self.ensure_speakers_exist(&details.speakers, deadline)
            .await?;
        let presentation = Presentation {
            owner: caller.identity().clone(),
            details,
            voters: VoterSet::new(),
        };
        let stored = store_call(
            deadline,
            "presentation.insert",
            self.presentations.insert(presentation),
        )
        .await?;
        info!(presentation_id = %stored.id, owner = %caller.identity(), "presentation created");
        Ok(stored)
    }

    pub async fn get(
        &self,
        id: EntityId,
        deadline: &Deadline,
    ) -> Result<Stored<Presentation>, Error> {
        store_call(deadline, "presentation.get", self.presentations.get(id))
            .await?
            .ok_or_else(|| not_found("presentation", id))
    }

    /// First presentation (lowest id) matching every populated filter field.
    pub async fn find(
        &self,
        filter: &PresentationFilter,
        deadline: &Deadline,
    ) -> Result<Stored<Presentation>, Error> {
        self.list(filter, deadline)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("no presentation matches the filter"))
    }

    /// Every presentation matching `filter`, in id order.
    pub async fn list(
        &self,
        filter: &PresentationFilter,
        deadline: &Deadline,
    ) -> Result<Vec<Stored<Presentation>>, Error> {
        let all = store_call(deadline, "presentation.list", self.presentations.list()).await?;
        Ok(all
            .into_iter()
            .filter(|presentation| filter.matches(&presentation.value.details))
            .collect())
    }

    /// Listing that exposes vote counts and speaker names but not voters.
    ///
    /// Speaker names are looked up concurrently, once per distinct speaker.
    /// Speakers that cannot be resolved are left out of the name list.
    pub async fn public_views(
        &self,
        filter: &PresentationFilter,
        deadline: &Deadline,
    ) -> Result<Vec<PresentationPublicView>, Error> {
        let presentations = self.list(filter, deadline).await?;
        let speaker_ids: BTreeSet<EntityId> = presentations
            .iter()
            .flat_map(|presentation| presentation.value.details.speakers.iter().copied())
            .collect();
        let lookups = speaker_ids.into_iter().map(|id| async move {
            let found = store_call(deadline, "speaker.get", self.speakers.get(id)).await;
            (id, found)
        });
        let mut names = BTreeMap::new();
        for (id, found) in join_all(lookups).await {
            match found {
                Ok(Some(speaker)) => {
                    names.insert(id, speaker.value.profile.full_name());
                }
                Ok(None) => debug!(speaker_id = %id, "listed presentation references a missing speaker"),
                Err(err) => warn!(speaker_id = %id, error = %err, "speaker lookup failed"),
            }
        }

        Ok(presentations
            .into_iter()
            .map(|presentation| PresentationPublicView {
                id: presentation.id,
                speakers: presentation
                    .value
                    .details
                    .speakers
                    .iter()
                    .filter_map(|speaker| names.get(speaker).cloned())
                    .collect(),
                votes: presentation.value.voters.len(),
                title: presentation.value.details.title,
                description: presentation.value.details.description,
            })
            .collect())
    }

    /// Replace the editable fields; owner and voters are preserved.
    ///
    /// Votes landing between the read and the save cause a re-read, so an
    /// edit never discards them.
    pub async fn update(
        &self,
        caller: &Caller,
        id: EntityId,
        details: PresentationDetails,
        deadline: &Deadline,
    ) -> Result<Stored<Presentation>, Error> {
        let details = details.validate()?;
        self.ensure_speakers_exist(&details.speakers, deadline)
            .await?;
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut current = self.get(id, deadline).await?;
            authorize(&current.value.owner, caller)?;
            current.value.details = details.clone();
            match deadline.run(self.presentations.save(&current)).await? {
                Ok(saved) => {
                    info!(presentation_id = %id, caller = %caller.identity(), "presentation updated");
                    return Ok(saved);
                }
                Err(EntityStoreError::RevisionMismatch { .. }) => {
                    debug!(presentation_id = %id, attempt, "presentation changed during update; retrying");
                }
                Err(other) => return Err(map_store_error("presentation.save", other)),
            }
        }
        Err(Error::conflict(
            "presentation is being modified concurrently; try again",
        ))
    }

    pub async fn delete(
        &self,
        caller: &Caller,
        id: EntityId,
        deadline: &Deadline,
    ) -> Result<(), Error> {
        let current = self.get(id, deadline).await?;
        authorize(&current.value.owner, caller)?;
        store_call(deadline, "presentation.delete", self.presentations.delete(id)).await?;
        info!(presentation_id = %id, caller = %caller.identity(), "presentation deleted");
        Ok(())
    }

    async fn ensure_speakers_exist(
        &self,
        speakers: &[EntityId],
        deadline: &Deadline,
    ) -> Result<(), Error> {
        let lookups = speakers.iter().map(|&id| async move {
            store_call(deadline, "speaker.get", self.speakers.get(id))
                .await
                .map(|found| (id, found.is_some()))
        });
        let unknown: Vec<EntityId> = try_join_all(lookups)
            .await?
            .into_iter()
            .filter_map(|(id, exists)| (!exists).then_some(id))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(
            Error::invalid_request("presentation references unknown speakers").with_details(
                json!({
                    "field": "speakers",
                    "code": "unknown_speaker",
                    "unknown": unknown,
                }),
            ),
        )
    }
}

#[cfg(test)]
#[path = "presentation_service_tests.rs"]
mod tests;
