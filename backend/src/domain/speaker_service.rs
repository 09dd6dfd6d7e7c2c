//! Speaker profile use cases.

use std::sync::Arc;

use tracing::info;

use super::ports::SpeakerRepository;
use super::store_access::{not_found, store_call};
use super::{
    Caller, Deadline, EntityId, Error, Speaker, SpeakerFilter, SpeakerProfile, Stored, authorize,
};

/// Speaker CRUD over the speaker repository.
#[derive(Clone)]
pub struct SpeakerService {
    speakers: Arc<dyn SpeakerRepository>,
}

impl SpeakerService {
    pub fn new(speakers: Arc<dyn SpeakerRepository>) -> Self {
        Self { speakers }
    }

    /// Create a profile owned by `caller`.
    pub async fn create(
        &self,
        caller: &Caller,
        profile: SpeakerProfile,
        deadline: &Deadline,
    ) -> Result<Stored<Speaker>, Error> {
        profile.validate()?;
        let speaker = Speaker {
            owner: caller.identity().clone(),
            profile,
        };
        let stored = store_call(deadline, "speaker.insert", self.speakers.insert(speaker)).await?;
        info!(speaker_id = %stored.id, owner = %caller.identity(), "speaker created");
        Ok(stored)
    }

    pub async fn get(&self, id: EntityId, deadline: &Deadline) -> Result<Stored<Speaker>, Error> {
        store_call(deadline, "speaker.get", self.speakers.get(id))
            .await?
            .ok_or_else(|| not_found("speaker", id))
    }

    /// First speaker (lowest id) matching every populated filter field.
    pub async fn find(
        &self,
        filter: &SpeakerFilter,
        deadline: &Deadline,
    ) -> Result<Stored<Speaker>, Error> {
        self.list(deadline)
            .await?
            .into_iter()
            .find(|speaker| filter.matches(&speaker.value.profile))
            .ok_or_else(|| Error::not_found("no speaker matches the filter"))
    }

    pub async fn list(&self, deadline: &Deadline) -> Result<Vec<Stored<Speaker>>, Error> {
        store_call(deadline, "speaker.list", self.speakers.list()).await
    }

    /// Replace the editable fields; the owner is preserved.
    pub async fn update(
        &self,
        caller: &Caller,
        id: EntityId,
        profile: SpeakerProfile,
        deadline: &Deadline,
    ) -> Result<Stored<Speaker>, Error> {
        profile.validate()?;
        let mut current = self.get(id, deadline).await?;
        authorize(&current.value.owner, caller)?;
        current.value.profile = profile;
        let saved = store_call(deadline, "speaker.save", self.speakers.save(&current)).await?;
        info!(speaker_id = %id, caller = %caller.identity(), "speaker updated");
        Ok(saved)
    }

    pub async fn delete(
        &self,
        caller: &Caller,
        id: EntityId,
        deadline: &Deadline,
    ) -> Result<(), Error> {
        let current = self.get(id, deadline).await?;
        authorize(&current.value.owner, caller)?;
        store_call(deadline, "speaker.delete", self.speakers.delete(id)).await?;
        info!(speaker_id = %id, caller = %caller.identity(), "speaker deleted");
        Ok(())
    }
}
