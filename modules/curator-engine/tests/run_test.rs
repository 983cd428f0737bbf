//! Full curation runs driven through the coordinator with in-memory collaborators.
//!
//! These cover the run-level contract:
//! - A completed run dispatches a vote and a comment per batch member and spends the budget
//! - The lease is honoured, renewed during long runs, reclaimed once expired, and always released
//! - Empty selections and scoring failures stop the run before dispatch
//! - Dispatch failures are counted without stopping the batch

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use curator_common::{Contribution, CuratorError};
use curator_engine::retry::RetryPolicy;
use curator_engine::testing::{
    contribution, MemoryRunState, MockAuth, MockPlatform, MockRepository, RecordingDispatcher,
};
use curator_engine::traits::RunStateStore;
use curator_engine::{AbortReason, EngineConfig, EngineDeps, RunCoordinator, RunOutcome};

fn engine_config() -> EngineConfig {
    EngineConfig::builder()
        .agent("curator")
        .forced(true)
        .lookup_delay(Duration::ZERO)
        .content_retry(RetryPolicy::content_lookup().without_delay())
        .scoring_retry(RetryPolicy::scoring_lookup().without_delay())
        .build()
}

struct Harness {
    platform: Arc<MockPlatform>,
    dispatcher: Arc<RecordingDispatcher>,
    run_state: Arc<MemoryRunState>,
    contributions: Vec<Contribution>,
}

impl Harness {
    fn new(contributions: Vec<Contribution>) -> Self {
        let platform = MockPlatform::new().with_contents_from(&contributions);
        Self {
            platform: Arc::new(platform),
            dispatcher: Arc::new(RecordingDispatcher::new()),
            run_state: Arc::new(MemoryRunState::new()),
            contributions,
        }
    }

    fn coordinator(&self) -> RunCoordinator {
        self.coordinator_with(engine_config())
    }

    fn coordinator_with(&self, config: EngineConfig) -> RunCoordinator {
        let deps = EngineDeps::builder()
            .repository(Arc::new(MockRepository::new(self.contributions.clone())))
            .content(self.platform.clone())
            .accounts(self.platform.clone())
            .follows(self.platform.clone())
            .auth(Arc::new(MockAuth::ok()))
            .dispatcher(self.dispatcher.clone())
            .run_state(self.run_state.clone())
            .build();
        RunCoordinator::new(config, deps)
    }
}

fn mixed_contributions() -> Vec<Contribution> {
    let types = ["development", "translations", "ideas", "task-development"];
    types
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let mut c = contribution(i as i64 + 1, &format!("author{i}"));
            c.contribution_type = t.to_string();
            c.net_votes = 10 - i as i64;
            c
        })
        .collect()
}

#[tokio::test]
async fn completed_run_spends_the_whole_budget() {
    let h = Harness::new(mixed_contributions());
    let report = h.coordinator().run().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.stats.candidates_selected, 4);
    assert_eq!(report.stats.votes_sent, 4);
    assert_eq!(report.stats.comments_sent, 4);

    let total: f64 = report.batch.candidates.iter().map(|c| c.final_vote).sum();
    assert!((total - 1000.0).abs() <= 0.01 * 4.0);
    assert!((report.stats.budget_used - total).abs() < 1e-9);

    let votes = h.dispatcher.votes();
    assert_eq!(votes.len(), 4);
    assert!(votes.iter().all(|v| v.voter == "curator" && v.weight <= 10_000));

    let comments = h.dispatcher.comments();
    assert!(comments.iter().all(|c| c.permlink.starts_with("re-author")));
    assert!(comments
        .iter()
        .all(|c| c.body.contains("I am @curator. I have just upvoted you!")));

    assert!(h.run_state.holder().is_none());
}

#[tokio::test]
async fn aggregate_types_are_scored_into_the_bucket() {
    let h = Harness::new(mixed_contributions());
    let report = h.coordinator().run().await.unwrap();

    let task = report
        .batch
        .candidates
        .iter()
        .find(|c| c.contribution_type() == "task-development")
        .unwrap();
    assert_eq!(task.category.as_deref(), Some("tasks-requests"));
}

#[tokio::test]
async fn live_lease_aborts_without_touching_anything() {
    let mut h = Harness::new(mixed_contributions());
    h.run_state =
        Arc::new(MemoryRunState::new().held_by("other-run", Utc::now() + chrono::Duration::minutes(10)));

    let report = h.coordinator().run().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Aborted(AbortReason::AlreadyRunning));
    assert!(h.dispatcher.votes().is_empty());
    assert_eq!(h.run_state.holder().as_deref(), Some("other-run"));
}

#[tokio::test]
async fn expired_lease_is_reclaimed() {
    let mut h = Harness::new(mixed_contributions());
    h.run_state =
        Arc::new(MemoryRunState::new().held_by("crashed-run", Utc::now() - chrono::Duration::minutes(1)));

    let report = h.coordinator().run().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(h.run_state.holder().is_none());
}

fn slow_config(lock_ttl_ms: i64, lookup_delay_ms: u64) -> EngineConfig {
    EngineConfig {
        lock_ttl: chrono::Duration::milliseconds(lock_ttl_ms),
        lookup_delay: Duration::from_millis(lookup_delay_ms),
        ..engine_config()
    }
}

#[tokio::test]
async fn long_run_keeps_its_lease_against_a_second_run() {
    let h = Harness::new(mixed_contributions()[..3].to_vec());
    let first = h.coordinator_with(slow_config(1000, 700));
    let second = h.coordinator_with(slow_config(1000, 700));

    let (first, second) = tokio::join!(first.run(), async {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        second.run().await
    });

    assert_eq!(first.unwrap().outcome, RunOutcome::Completed);
    assert_eq!(
        second.unwrap().outcome,
        RunOutcome::Aborted(AbortReason::AlreadyRunning)
    );
    assert_eq!(h.dispatcher.votes().len(), 3);
    assert!(h.run_state.holder().is_none());
}

#[tokio::test]
async fn run_that_loses_its_lease_stops_before_dispatch() {
    let h = Harness::new(mixed_contributions()[..2].to_vec());
    let coordinator = h.coordinator_with(slow_config(200, 600));

    let (report, taken) = tokio::join!(coordinator.run(), async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        h.run_state
            .try_acquire("intruder", chrono::Duration::minutes(10))
            .await
    });

    assert!(taken.unwrap());
    let report = report.unwrap();
    assert_eq!(report.outcome, RunOutcome::Aborted(AbortReason::LeaseLost));
    assert!(AbortReason::LeaseLost.is_failure());
    assert!(h.dispatcher.votes().is_empty());
    assert_eq!(h.run_state.holder().as_deref(), Some("intruder"));
}

#[tokio::test]
async fn empty_selection_ends_gracefully() {
    let h = Harness::new(vec![]);
    let report = h.coordinator().run().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Aborted(AbortReason::NoCandidates));
    assert!(!AbortReason::NoCandidates.is_failure());
    assert!(h.run_state.holder().is_none());
}

#[tokio::test]
async fn own_and_already_voted_posts_are_never_selected() {
    let own = contribution(1, "curator");
    let mut voted = contribution(2, "alice");
    voted.active_votes.push(curator_common::ActiveVote {
        voter: "curator".to_string(),
        percent: 5000.0,
        rshares: 10.0,
    });
    let h = Harness::new(vec![own, voted]);

    let report = h.coordinator().run().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Aborted(AbortReason::NoCandidates));
}

#[tokio::test]
async fn scoring_failure_aborts_the_run_and_releases_the_lease() {
    let contributions = mixed_contributions();
    let mut h = Harness::new(contributions.clone());
    h.platform = Arc::new(
        MockPlatform::new()
            .with_contents_from(&contributions)
            .fail_account("author2"),
    );

    let result = h.coordinator().run().await;

    let err = result.unwrap_err();
    assert!(matches!(err, CuratorError::Provider { provider: "accounts", .. }));
    assert!(h.dispatcher.votes().is_empty());
    assert!(h.run_state.holder().is_none());
}

#[tokio::test]
async fn dispatch_failures_are_counted_and_do_not_stop_the_batch() {
    let mut h = Harness::new(mixed_contributions());
    h.dispatcher = Arc::new(
        RecordingDispatcher::new()
            .fail_votes_for("author0")
            .fail_comments_for("author1"),
    );

    let report = h.coordinator().run().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.stats.votes_sent, 3);
    assert_eq!(report.stats.votes_failed, 1);
    assert_eq!(report.stats.comments_sent, 2);
    assert_eq!(report.stats.comments_failed, 1);
    assert!(h.dispatcher.votes().iter().all(|v| v.author != "author0"));
}
