//! Tests for the sync engine.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    ApiKey, EventPayload, EventsApiError, GroupName, MockEventsApi, MockSyncSettingsSource,
    SyncSettingsError,
};
use crate::domain::{MeetupDetails, UserIdentity};

fn meetup_date() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2030-05-04T18:00:00Z")
        .expect("fixture timestamp")
        .with_timezone(&Utc)
}

fn meetup(title: &str, external_id: Option<&str>) -> Meetup {
    Meetup {
        owner: UserIdentity::new("owner@example.com").expect("valid identity"),
        details: MeetupDetails {
            title: title.to_owned(),
            description: "Monthly meetup".to_owned(),
            date: meetup_date(),
            vote_end: meetup_date() - TimeDelta::days(3),
            presentations: Vec::new(),
            venue: None,
        },
        external_id: external_id.map(|raw| ExternalEventId::new(raw).expect("valid id")),
    }
}

/// Compare-and-swap meetup store. `interfere_with` renames the meetup once,
/// right before the next save, to simulate a concurrent edit.
#[derive(Default)]
struct CasMeetups {
    rows: Mutex<BTreeMap<EntityId, Stored<Meetup>>>,
    interfere_with: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl CasMeetups {
    fn with(meetups: Vec<Meetup>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().expect("rows lock");
            for (index, meetup) in meetups.into_iter().enumerate() {
                let id = EntityId::new(i64::try_from(index).expect("small index") + 1);
                rows.insert(id, Stored::new(id, 1, meetup));
            }
        }
        Arc::new(store)
    }

    fn row(&self, id: i64) -> Stored<Meetup> {
        self.rows.lock().expect("rows lock")[&EntityId::new(id)].clone()
    }

    fn saves(&self) -> usize {
        *self.saves.lock().expect("saves lock")
    }
}

#[async_trait]
impl MeetupRepository for CasMeetups {
    async fn get(&self, id: EntityId) -> Result<Option<Stored<Meetup>>, EntityStoreError> {
        Ok(self.rows.lock().expect("rows lock").get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Stored<Meetup>>, EntityStoreError> {
        Ok(self.rows.lock().expect("rows lock").values().cloned().collect())
    }

    async fn insert(&self, _meetup: Meetup) -> Result<Stored<Meetup>, EntityStoreError> {
        Err(EntityStoreError::query("insert not supported"))
    }

    async fn save(&self, meetup: &Stored<Meetup>) -> Result<Stored<Meetup>, EntityStoreError> {
        let mut rows = self.rows.lock().expect("rows lock");
        let row = rows
            .get_mut(&meetup.id)
            .ok_or_else(|| EntityStoreError::missing(meetup.id.to_string()))?;
        if let Some(title) = self.interfere_with.lock().expect("interfere lock").take() {
            row.value.details.title = title;
            row.revision += 1;
        }
        if row.revision != meetup.revision {
            return Err(EntityStoreError::revision_mismatch(
                meetup.revision,
                row.revision,
            ));
        }
        *row = Stored::new(meetup.id, meetup.revision + 1, meetup.value.clone());
        *self.saves.lock().expect("saves lock") += 1;
        Ok(row.clone())
    }

    async fn delete(&self, id: EntityId) -> Result<(), EntityStoreError> {
        self.rows.lock().expect("rows lock").remove(&id);
        Ok(())
    }
}

fn settings() -> MockSyncSettingsSource {
    let mut settings = MockSyncSettingsSource::new();
    settings
        .expect_api_key()
        .returning(|| Ok(ApiKey::new("K1")));
    settings
        .expect_group_name()
        .returning(|| Ok(GroupName::new("G1")));
    settings
}

fn engine(
    settings: MockSyncSettingsSource,
    meetups: Arc<CasMeetups>,
    events: MockEventsApi,
) -> SyncEngine {
    SyncEngine::new(Arc::new(settings), meetups, Arc::new(events))
}

#[fixture]
fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

#[rstest]
#[tokio::test]
async fn create_remote_persists_external_id_once(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", None)]);
    let mut events = MockEventsApi::new();
    events
        .expect_create_event()
        .withf(|credentials, payload| {
            credentials.api_key.expose() == "K1"
                && credentials.group.as_str() == "G1"
                && payload.name == "T"
                && payload.time_ms == meetup_date().timestamp_millis()
        })
        .times(1)
        .returning(|_, _| Ok(ExternalEventId::new("E1").expect("valid id")));
    let engine = engine(settings(), store.clone(), events);

    let external_id = engine
        .create_remote(EntityId::new(1), &deadline)
        .await
        .expect("create succeeds");

    assert_eq!(external_id.as_str(), "E1");
    assert_eq!(store.row(1).value.external_id, Some(external_id));
    assert_eq!(store.saves(), 1);
}

#[rstest]
#[tokio::test]
async fn rejected_create_leaves_meetup_unsynced(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", None)]);
    let mut events = MockEventsApi::new();
    events
        .expect_create_event()
        .returning(|_, _| Err(EventsApiError::rejected(500_u16, "upstream exploded")));
    let engine = engine(settings(), store.clone(), events);

    let err = engine
        .create_remote(EntityId::new(1), &deadline)
        .await
        .expect_err("upstream rejection");

    assert!(matches!(err, SyncError::Upstream(EventsApiError::Rejected { status: 500, .. })));
    let row = store.row(1);
    assert_eq!(row.value.external_id, None);
    assert_eq!(row.revision, 1);
}

#[rstest]
#[tokio::test]
async fn settings_failure_prevents_external_call(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", None)]);
    let mut settings = MockSyncSettingsSource::new();
    settings
        .expect_api_key()
        .returning(|| Err(SyncSettingsError::missing("MEETUP_API_KEY")));
    settings
        .expect_group_name()
        .returning(|| Ok(GroupName::new("G1")));
    let mut events = MockEventsApi::new();
    events.expect_create_event().never();
    let engine = engine(settings, store.clone(), events);

    let err = engine
        .create_remote(EntityId::new(1), &deadline)
        .await
        .expect_err("missing api key");

    assert!(matches!(err, SyncError::Settings(SyncSettingsError::Missing { .. })));
    assert_eq!(store.saves(), 0);
}

#[rstest]
#[tokio::test]
async fn missing_meetup_is_reported(deadline: Deadline) {
    let store = CasMeetups::with(vec![]);
    let mut events = MockEventsApi::new();
    events.expect_create_event().never();
    let engine = engine(settings(), store, events);

    let err = engine
        .create_remote(EntityId::new(42), &deadline)
        .await
        .expect_err("no such meetup");

    assert_eq!(err, SyncError::MeetupNotFound(EntityId::new(42)));
}

#[rstest]
#[tokio::test]
async fn create_remote_refuses_already_synced_meetups(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", Some("E9"))]);
    let mut events = MockEventsApi::new();
    events.expect_create_event().never();
    let engine = engine(settings(), store, events);

    let err = engine
        .create_remote(EntityId::new(1), &deadline)
        .await
        .expect_err("already synced");

    assert!(matches!(err, SyncError::AlreadySynced { .. }));
}

#[tokio::test(start_paused = true)]
async fn slow_settings_hit_the_deadline() {
    /// Settings source that never answers in time.
    struct StalledSettings;

    #[async_trait]
    impl SyncSettingsSource for StalledSettings {
        async fn api_key(&self) -> Result<ApiKey, SyncSettingsError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ApiKey::new("K1"))
        }

        async fn group_name(&self) -> Result<GroupName, SyncSettingsError> {
            Ok(GroupName::new("G1"))
        }
    }

    let store = CasMeetups::with(vec![meetup("T", None)]);
    let mut events = MockEventsApi::new();
    events.expect_create_event().never();
    let engine = SyncEngine::new(Arc::new(StalledSettings), store, Arc::new(events));

    let err = engine
        .create_remote(EntityId::new(1), &Deadline::after(Duration::from_secs(2)))
        .await
        .expect_err("deadline exceeded");

    assert_eq!(err, SyncError::DeadlineExceeded);
}

#[rstest]
#[tokio::test]
async fn write_back_survives_concurrent_edit(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", None)]);
    *store.interfere_with.lock().expect("interfere lock") = Some("Renamed".to_owned());
    let mut events = MockEventsApi::new();
    events
        .expect_create_event()
        .times(1)
        .returning(|_, _| Ok(ExternalEventId::new("E1").expect("valid id")));
    let engine = engine(settings(), store.clone(), events);

    engine
        .create_remote(EntityId::new(1), &deadline)
        .await
        .expect("create succeeds after retry");

    let row = store.row(1);
    assert_eq!(row.value.details.title, "Renamed");
    assert_eq!(
        row.value.external_id.as_ref().map(ExternalEventId::as_str),
        Some("E1")
    );
}

#[rstest]
#[tokio::test]
async fn update_one_skips_unsynced_meetups(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", None)]);
    let mut events = MockEventsApi::new();
    events.expect_update_event().never();
    let engine = engine(settings(), store, events);

    let outcome = engine
        .update_one(EntityId::new(1), &deadline)
        .await
        .expect("skip");

    assert_eq!(outcome, SyncOutcome::Skipped);
}

#[rstest]
#[tokio::test]
async fn update_one_pushes_synced_meetups(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("T", Some("E1"))]);
    let mut events = MockEventsApi::new();
    events
        .expect_update_event()
        .with(
            mockall::predicate::always(),
            eq(ExternalEventId::new("E1").expect("valid id")),
            mockall::predicate::always(),
        )
        .times(1)
        .returning(|_, _, _| Ok(()));
    let engine = engine(settings(), store, events);

    let outcome = engine
        .update_one(EntityId::new(1), &deadline)
        .await
        .expect("update");

    assert_eq!(outcome, SyncOutcome::Updated);
}

#[rstest]
#[tokio::test]
async fn update_remote_reports_partial_failure(deadline: Deadline) {
    let store = CasMeetups::with(vec![
        meetup("A", Some("E1")),
        meetup("B", Some("E2")),
        meetup("C", Some("E3")),
        meetup("Local", None),
    ]);
    let issued = Arc::new(Mutex::new(Vec::new()));
    let issued_in_mock = Arc::clone(&issued);
    let mut events = MockEventsApi::new();
    events
        .expect_update_event()
        .times(3)
        .returning(move |_, event_id, _| {
            issued_in_mock
                .lock()
                .expect("issued lock")
                .push(event_id.as_str().to_owned());
            if event_id.as_str() == "E2" {
                Err(EventsApiError::rejected(503_u16, "unavailable"))
            } else {
                Ok(())
            }
        });
    let engine = engine(settings(), store, events);

    let err = engine
        .update_remote(&deadline)
        .await
        .expect_err("one meetup fails");

    let aggregate = match err {
        BulkSyncError::Partial(aggregate) => aggregate,
        other => panic!("expected partial failure, got {other:?}"),
    };
    assert_eq!(
        aggregate.failures.keys().copied().collect::<Vec<_>>(),
        [EntityId::new(2)]
    );
    assert_eq!(aggregate.report.updated, [EntityId::new(1), EntityId::new(3)]);
    assert_eq!(aggregate.report.skipped, [EntityId::new(4)]);
    let mut issued = issued.lock().expect("issued lock").clone();
    issued.sort();
    assert_eq!(issued, ["E1", "E2", "E3"]);
}

#[rstest]
#[tokio::test]
async fn update_remote_succeeds_when_every_meetup_syncs(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("A", Some("E1")), meetup("B", None)]);
    let mut events = MockEventsApi::new();
    events
        .expect_update_event()
        .times(1)
        .returning(|_, _, _| Ok(()));
    let engine = engine(settings(), store, events);

    let report = engine.update_remote(&deadline).await.expect("bulk sync");

    assert_eq!(report.updated, [EntityId::new(1)]);
    assert_eq!(report.skipped, [EntityId::new(2)]);
}

#[rstest]
#[tokio::test]
async fn panicking_task_is_reported_as_failure(deadline: Deadline) {
    /// Adapter that panics for one event id.
    struct PanickyEvents;

    #[async_trait]
    impl EventsApi for PanickyEvents {
        async fn create_event(
            &self,
            _credentials: &SyncCredentials,
            _payload: &EventPayload,
        ) -> Result<ExternalEventId, EventsApiError> {
            Err(EventsApiError::transport("not used"))
        }

        async fn update_event(
            &self,
            _credentials: &SyncCredentials,
            event_id: &ExternalEventId,
            _payload: &EventPayload,
        ) -> Result<(), EventsApiError> {
            assert_ne!(event_id.as_str(), "E1", "simulated adapter bug");
            Ok(())
        }
    }

    let store = CasMeetups::with(vec![meetup("A", Some("E1")), meetup("B", Some("E2"))]);
    let engine = SyncEngine::new(Arc::new(settings()), store, Arc::new(PanickyEvents));

    let err = engine
        .update_remote(&deadline)
        .await
        .expect_err("panicked task is a failure");

    let aggregate = match err {
        BulkSyncError::Partial(aggregate) => aggregate,
        other => panic!("expected partial failure, got {other:?}"),
    };
    assert!(matches!(
        aggregate.failures.get(&EntityId::new(1)),
        Some(SyncError::TaskAborted(_))
    ));
    assert_eq!(aggregate.report.updated, [EntityId::new(2)]);
}

#[rstest]
#[tokio::test]
async fn update_remote_fails_fast_when_settings_are_missing(deadline: Deadline) {
    let store = CasMeetups::with(vec![meetup("A", Some("E1"))]);
    let mut settings = MockSyncSettingsSource::new();
    settings
        .expect_api_key()
        .returning(|| Ok(ApiKey::new("K1")));
    settings
        .expect_group_name()
        .returning(|| Err(SyncSettingsError::missing("MEETUP_GROUP_NAME")));
    let mut events = MockEventsApi::new();
    events.expect_update_event().never();
    let engine = engine(settings, store, events);

    let err = engine
        .update_remote(&deadline)
        .await
        .expect_err("missing group");

    assert!(matches!(err, BulkSyncError::Prepare(SyncError::Settings(_))));
}
