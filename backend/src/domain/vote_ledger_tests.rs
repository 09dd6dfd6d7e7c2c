//! Tests for the vote ledger.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockPresentationRepository;
use crate::domain::{ErrorCode, Presentation, PresentationDetails, Stored};

fn identity(raw: &str) -> UserIdentity {
    UserIdentity::new(raw).expect("valid identity")
}

fn presentation(voters: &[&str]) -> Presentation {
    Presentation {
        owner: identity("owner@example.com"),
        details: PresentationDetails {
            title: "Ownership".to_owned(),
            description: "Borrowing without tears".to_owned(),
            speakers: vec![EntityId::new(1)],
        },
        voters: VoterSet::from(voters.iter().map(|raw| identity(raw)).collect::<Vec<_>>()),
    }
}

#[fixture]
fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(5))
}

/// Minimal compare-and-swap presentation store. With `latency` set, reads
/// and saves both suspend, so concurrent voters move in lockstep.
#[derive(Default)]
struct CasPresentations {
    rows: Mutex<BTreeMap<EntityId, Stored<Presentation>>>,
    latency: Option<Duration>,
}

impl CasPresentations {
    fn seeded(presentation: Presentation) -> Arc<Self> {
        Arc::new(Self::seeded_with(presentation, None))
    }

    fn slow(presentation: Presentation, latency: Duration) -> Arc<Self> {
        Arc::new(Self::seeded_with(presentation, Some(latency)))
    }

    fn seeded_with(presentation: Presentation, latency: Option<Duration>) -> Self {
        let store = Self {
            latency,
            ..Self::default()
        };
        store
            .rows
            .lock()
            .expect("rows lock")
            .insert(EntityId::new(1), Stored::new(EntityId::new(1), 1, presentation));
        store
    }

    async fn pause(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn voters(&self) -> VoterSet {
        self.rows.lock().expect("rows lock")[&EntityId::new(1)]
            .value
            .voters
            .clone()
    }
}

#[async_trait]
impl PresentationRepository for CasPresentations {
    async fn get(
        &self,
        id: EntityId,
    ) -> Result<Option<Stored<Presentation>>, EntityStoreError> {
        let snapshot = self.rows.lock().expect("rows lock").get(&id).cloned();
        self.pause().await;
        Ok(snapshot)
    }

    async fn list(&self) -> Result<Vec<Stored<Presentation>>, EntityStoreError> {
        Ok(self.rows.lock().expect("rows lock").values().cloned().collect())
    }

    async fn insert(
        &self,
        _presentation: Presentation,
    ) -> Result<Stored<Presentation>, EntityStoreError> {
        Err(EntityStoreError::query("insert not supported"))
    }

    async fn save(
        &self,
        presentation: &Stored<Presentation>,
    ) -> Result<Stored<Presentation>, EntityStoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut rows = self.rows.lock().expect("rows lock");
        let row = rows
            .get_mut(&presentation.id)
            .ok_or_else(|| EntityStoreError::missing(presentation.id.to_string()))?;
        if row.revision != presentation.revision {
            return Err(EntityStoreError::revision_mismatch(
                presentation.revision,
                row.revision,
            ));
        }
        *row = Stored::new(
            presentation.id,
            presentation.revision + 1,
            presentation.value.clone(),
        );
        Ok(row.clone())
    }

    async fn delete(&self, _id: EntityId) -> Result<(), EntityStoreError> {
        Ok(())
    }
}

#[rstest]
#[tokio::test]
async fn upvote_twice_records_once(deadline: Deadline) {
    let store = CasPresentations::seeded(presentation(&[]));
    let ledger = VoteLedger::new(store.clone());
    let voter = identity("ada@example.com");

    let first = ledger
        .upvote(EntityId::new(1), &voter, &deadline)
        .await
        .expect("first upvote");
    let second = ledger
        .upvote(EntityId::new(1), &voter, &deadline)
        .await
        .expect("second upvote");

    assert_eq!(first, UpvoteOutcome::Recorded);
    assert_eq!(second, UpvoteOutcome::AlreadyVoted);
    assert_eq!(store.voters().len(), 1);
}

#[rstest]
#[tokio::test]
async fn downvote_without_vote_is_a_no_op(deadline: Deadline) {
    let store = CasPresentations::seeded(presentation(&["bob@example.com"]));
    let ledger = VoteLedger::new(store.clone());

    let outcome = ledger
        .downvote(EntityId::new(1), &identity("ada@example.com"), &deadline)
        .await
        .expect("downvote");

    assert_eq!(outcome, DownvoteOutcome::NotVoted);
    assert_eq!(store.voters().len(), 1);
}

#[rstest]
#[tokio::test]
async fn upvote_then_downvote_restores_voter_set(deadline: Deadline) {
    let store = CasPresentations::seeded(presentation(&["bob@example.com", "cy@example.com"]));
    let before = store.voters();
    let ledger = VoteLedger::new(store.clone());
    let voter = identity("ada@example.com");

    ledger
        .upvote(EntityId::new(1), &voter, &deadline)
        .await
        .expect("upvote");
    let outcome = ledger
        .downvote(EntityId::new(1), &voter, &deadline)
        .await
        .expect("downvote");

    assert_eq!(outcome, DownvoteOutcome::Removed);
    assert_eq!(store.voters(), before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upvotes_by_distinct_users_are_all_kept(deadline: Deadline) {
    const VOTERS: usize = 16;
    let store = CasPresentations::seeded(presentation(&[]));
    let ledger = VoteLedger::new(store.clone());

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..VOTERS {
        let ledger = ledger.clone();
        tasks.spawn(async move {
            let voter = identity(&format!("user{n}@example.com"));
            ledger.upvote(EntityId::new(1), &voter, &deadline).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.expect("task completes").expect("upvote succeeds");
        assert_eq!(outcome, UpvoteOutcome::Recorded);
    }

    assert_eq!(store.voters().len(), VOTERS);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upvotes_by_same_user_record_one_vote(deadline: Deadline) {
    let store = CasPresentations::seeded(presentation(&[]));
    let ledger = VoteLedger::new(store.clone());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        tasks.spawn(async move {
            let voter = identity("ada@example.com");
            ledger.upvote(EntityId::new(1), &voter, &deadline).await
        });
    }
    let mut recorded = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.expect("task completes").expect("upvote succeeds") == UpvoteOutcome::Recorded {
            recorded += 1;
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(store.voters().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lockstep_voters_on_a_slow_store_are_all_recorded(deadline: Deadline) {
    const VOTERS: usize = 24;
    let store = CasPresentations::slow(presentation(&[]), Duration::from_millis(2));
    let ledger = VoteLedger::new(store.clone());
    let start = Arc::new(tokio::sync::Barrier::new(VOTERS));

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..VOTERS {
        let ledger = ledger.clone();
        let start = Arc::clone(&start);
        tasks.spawn(async move {
            let voter = identity(&format!("user{n}@example.com"));
            start.wait().await;
            ledger.upvote(EntityId::new(1), &voter, &deadline).await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.expect("task completes").expect("upvote succeeds");
        assert_eq!(outcome, UpvoteOutcome::Recorded);
    }

    assert_eq!(store.voters().len(), VOTERS);
}

#[rstest]
#[tokio::test]
async fn endless_contention_stops_at_the_deadline() {
    let mut repo = MockPresentationRepository::new();
    repo.expect_get()
        .returning(|id| Ok(Some(Stored::new(id, 1, presentation(&[])))));
    repo.expect_save()
        .returning(|_| Err(EntityStoreError::revision_mismatch(1_u32, 2_u32)));
    let ledger = VoteLedger::new(Arc::new(repo));
    let deadline = Deadline::after(Duration::from_millis(50));

    let err = ledger
        .upvote(EntityId::new(1), &identity("ada@example.com"), &deadline)
        .await
        .expect_err("deadline exceeded");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn revision_mismatch_is_retried(deadline: Deadline) {
    let mut repo = MockPresentationRepository::new();
    let reads = Arc::new(AtomicUsize::new(0));
    let reads_in_mock = Arc::clone(&reads);
    repo.expect_get().returning(move |id| {
        let revision = u32::try_from(reads_in_mock.fetch_add(1, Ordering::SeqCst) + 1)
            .expect("small revision");
        Ok(Some(Stored::new(id, revision, presentation(&[]))))
    });
    repo.expect_save().times(2).returning(|stored| {
        if stored.revision == 1 {
            Err(EntityStoreError::revision_mismatch(1_u32, 2_u32))
        } else {
            Ok(Stored::new(stored.id, stored.revision + 1, stored.value.clone()))
        }
    });
    let ledger = VoteLedger::new(Arc::new(repo));

    let outcome = ledger
        .upvote(EntityId::new(1), &identity("ada@example.com"), &deadline)
        .await
        .expect("upvote after retry");

    assert_eq!(outcome, UpvoteOutcome::Recorded);
    assert_eq!(reads.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn capped_retries_report_conflict(deadline: Deadline) {
    let mut repo = MockPresentationRepository::new();
    repo.expect_get()
        .returning(|id| Ok(Some(Stored::new(id, 1, presentation(&[])))));
    repo.expect_save()
        .times(3)
        .returning(|_| Err(EntityStoreError::revision_mismatch(1_u32, 2_u32)));
    let ledger = VoteLedger::new(Arc::new(repo)).with_max_attempts(3);

    let err = ledger
        .upvote(EntityId::new(1), &identity("ada@example.com"), &deadline)
        .await
        .expect_err("conflict after retries");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn missing_presentation_is_not_found(deadline: Deadline) {
    let mut repo = MockPresentationRepository::new();
    repo.expect_get().returning(|_| Ok(None));
    repo.expect_save().never();
    let ledger = VoteLedger::new(Arc::new(repo));

    let err = ledger
        .downvote(EntityId::new(7), &identity("ada@example.com"), &deadline)
        .await
        .expect_err("missing presentation");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn has_voted_is_false_for_anonymous_callers(deadline: Deadline) {
    let mut repo = MockPresentationRepository::new();
    repo.expect_get().never();
    let ledger = VoteLedger::new(Arc::new(repo));

    let voted = ledger
        .has_voted(EntityId::new(1), None, &deadline)
        .await
        .expect("anonymous lookup");

    assert!(!voted);
}

#[rstest]
#[tokio::test]
async fn has_voted_reflects_membership(deadline: Deadline) {
    let store = CasPresentations::seeded(presentation(&["ada@example.com"]));
    let ledger = VoteLedger::new(store);

    let ada = identity("ada@example.com");
    let bob = identity("bob@example.com");
    assert!(
        ledger
            .has_voted(EntityId::new(1), Some(&ada), &deadline)
            .await
            .expect("lookup")
    );
    assert!(
        !ledger
            .has_voted(EntityId::new(1), Some(&bob), &deadline)
            .await
            .expect("lookup")
    );
}

#[test]
fn outcomes_serialise_snake_case() {
    let value = serde_json::to_value(UpvoteOutcome::AlreadyVoted).expect("serialise");
    assert_eq!(value, "already_voted");
}
