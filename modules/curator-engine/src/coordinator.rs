//! Run orchestration: one curation pass under the single-flight lease.
//!
//! Stages run strictly in order; any abort or fatal error skips the rest. The
//! lease is renewed between candidates and before dispatch, and released on
//! every exit path once acquired.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use curator_common::denylist::AUTOMATED_VOTERS;
use curator_common::{default_categories, CategoryTable, CuratorError, Result, FULL_VOTING_POWER};
use tracing::{error, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::allocation::AllocationContext;
use crate::comment::{comment_metadata, comment_permlink, render_comment_body};
use crate::dispatch::vote_weight;
use crate::lease::Lease;
use crate::normalize::normalize;
use crate::retry::RetryPolicy;
use crate::scoring::PostScorer;
use crate::selector::{CandidateSelector, EligibilityFilter};
use crate::traits::{
    AccessToken, AccountProvider, ActionDispatcher, AuthProvider, CommentAction, ContentProvider,
    ContentRepository, FollowProvider, RunStateStore, VoteAction,
};
use crate::types::{
    AbortReason, BatchRanking, Candidate, RunOutcome, RunReport, RunStage, RunStats, VoteBatch,
};

fn default_denylist() -> Vec<String> {
    AUTOMATED_VOTERS.iter().map(|s| s.to_string()).collect()
}

/// Engine tunables for one coordinator.
#[derive(Debug, Clone, TypedBuilder)]
pub struct EngineConfig {
    /// The curating account. Never selects its own posts or posts it already voted.
    #[builder(setter(into))]
    pub agent: String,
    #[builder(default = 1000.0)]
    pub total_budget: f64,
    #[builder(default = 5)]
    pub batch_size: usize,
    #[builder(default)]
    pub ranking: BatchRanking,
    #[builder(default = chrono::Duration::hours(6))]
    pub min_post_age: chrono::Duration,
    /// Pause between per-candidate scoring lookups.
    #[builder(default = Duration::from_secs(3))]
    pub lookup_delay: Duration,
    #[builder(default = RetryPolicy::content_lookup())]
    pub content_retry: RetryPolicy,
    #[builder(default = RetryPolicy::scoring_lookup())]
    pub scoring_retry: RetryPolicy,
    #[builder(default = chrono::Duration::minutes(30))]
    pub lock_ttl: chrono::Duration,
    /// Skip the voting-power gate.
    #[builder(default)]
    pub forced: bool,
    #[builder(default = default_categories(3.0))]
    pub categories: CategoryTable,
    #[builder(default = default_denylist())]
    pub denylist: Vec<String>,
}

/// External collaborators of the coordinator.
#[derive(Clone, TypedBuilder)]
pub struct EngineDeps {
    pub repository: Arc<dyn ContentRepository>,
    pub content: Arc<dyn ContentProvider>,
    pub accounts: Arc<dyn AccountProvider>,
    pub follows: Arc<dyn FollowProvider>,
    pub auth: Arc<dyn AuthProvider>,
    pub dispatcher: Arc<dyn ActionDispatcher>,
    pub run_state: Arc<dyn RunStateStore>,
}

pub struct RunCoordinator {
    config: EngineConfig,
    deps: EngineDeps,
}

impl RunCoordinator {
    pub fn new(config: EngineConfig, deps: EngineDeps) -> Self {
        Self { config, deps }
    }

    /// Run one curation pass. Acquires the lease, runs the stages, releases the lease.
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        self.enter(&run_id, RunStage::CheckingSingleFlight);

        let acquired = self
            .deps
            .run_state
            .try_acquire(&run_id, self.config.lock_ttl)
            .await?;
        if !acquired {
            warn!(run_id = %run_id, reason = %AbortReason::AlreadyRunning, "Run aborted");
            return Ok(RunReport::aborted(
                &run_id,
                AbortReason::AlreadyRunning,
                RunStats::default(),
            ));
        }

        let lease = Lease::new(self.deps.run_state.clone(), &run_id, self.config.lock_ttl);
        let result = match self.run_inner(&run_id, &lease).await {
            Err(CuratorError::LeaseLost) => Ok(RunReport::aborted(
                &run_id,
                AbortReason::LeaseLost,
                RunStats::default(),
            )),
            other => other,
        };

        // Always release the lease
        if let Err(e) = self.deps.run_state.release(&run_id).await {
            warn!(run_id = %run_id, error = %e, "Failed to release curator lease");
        }

        match &result {
            Ok(report) => match &report.outcome {
                RunOutcome::Completed => {
                    self.enter(&run_id, RunStage::Done);
                    info!(run_id = %run_id, stats = %report.stats, "Run complete");
                }
                RunOutcome::Aborted(reason) => {
                    self.enter(&run_id, RunStage::Aborted);
                    if reason.is_failure() {
                        error!(run_id = %run_id, reason = %reason, stats = %report.stats, "Run aborted");
                    } else {
                        warn!(run_id = %run_id, reason = %reason, stats = %report.stats, "Run aborted");
                    }
                }
            },
            Err(e) => {
                self.enter(&run_id, RunStage::Aborted);
                error!(run_id = %run_id, error = %e, "Run failed");
            }
        }

        result
    }

    /// Force-clear the lease left behind by a crashed run.
    pub async fn unlock(&self) -> Result<bool> {
        self.deps.run_state.force_release().await
    }

    async fn run_inner(&self, run_id: &str, lease: &Lease) -> Result<RunReport> {
        let mut stats = RunStats::default();

        if self.config.forced {
            info!(run_id = %run_id, "Forced run, skipping voting power check");
        } else {
            self.enter(run_id, RunStage::CheckingVotingPower);
            if let Some(reason) = self.check_voting_power().await? {
                return Ok(RunReport::aborted(run_id, reason, stats));
            }
        }

        self.enter(run_id, RunStage::Authorizing);
        let token = self.deps.auth.access_token().await?;

        self.enter(run_id, RunStage::Selecting);
        let selector = CandidateSelector::new(
            self.deps.repository.clone(),
            self.deps.content.clone(),
            self.config.content_retry,
        )
        .with_lease(lease.clone());
        let filter = EligibilityFilter::new(&self.config.agent, self.config.min_post_age, Utc::now());
        let (candidates, selection) = selector.select(&filter).await?;
        stats.candidates_selected = candidates.len() as u64;
        stats.candidates_dropped = selection.dropped as u64;
        if candidates.is_empty() {
            return Ok(RunReport::aborted(run_id, AbortReason::NoCandidates, stats));
        }

        self.enter(run_id, RunStage::Allocating);
        let mut ctx = AllocationContext::new(&self.config.categories, self.config.total_budget);
        match ctx.allocate(&candidates) {
            Ok(()) => {}
            Err(CuratorError::AllocationDegenerate) => {
                return Ok(RunReport::aborted(
                    run_id,
                    AbortReason::AllocationDegenerate,
                    stats,
                ));
            }
            Err(e) => return Err(e),
        }

        self.enter(run_id, RunStage::Scoring);
        let category_stats = self.deps.run_state.category_stats().await?;
        let scorer = PostScorer::new(
            self.deps.repository.clone(),
            self.deps.accounts.clone(),
            self.deps.follows.clone(),
            self.config.scoring_retry,
            self.config.lookup_delay,
            &self.config.denylist,
        )
        .with_lease(lease.clone());
        let scored = scorer.score_all(candidates, &category_stats, &mut ctx).await?;
        stats.candidates_scored = scored.len() as u64;
        if scored.is_empty() {
            return Ok(RunReport::aborted(run_id, AbortReason::NoCandidates, stats));
        }

        self.enter(run_id, RunStage::Normalizing);
        let batch = normalize(self.rank(scored), &ctx)?;

        self.enter(run_id, RunStage::Dispatching);
        lease.renew().await?;
        self.dispatch(&token, &batch, &mut stats).await;

        Ok(RunReport {
            run_id: run_id.to_string(),
            outcome: RunOutcome::Completed,
            stats,
            batch,
        })
    }

    /// `Some(reason)` when the agent has not recharged to full voting power.
    async fn check_voting_power(&self) -> Result<Option<AbortReason>> {
        let agent = self.config.agent.as_str();
        let account = self
            .config
            .scoring_retry
            .run("get_account", || self.deps.accounts.get_account(agent))
            .await?;

        let voting_power = account.current_voting_power(Utc::now());
        info!(
            agent,
            voting_power_pct = voting_power / 100.0,
            "Current voting power"
        );
        if voting_power < FULL_VOTING_POWER {
            return Ok(Some(AbortReason::VotingPowerTooLow { voting_power }));
        }
        Ok(None)
    }

    /// Order scored candidates by the configured ranking and cut to the batch size.
    fn rank(&self, mut scored: Vec<Candidate>) -> Vec<Candidate> {
        if self.config.ranking == BatchRanking::RawScore {
            scored.sort_by(|a, b| b.raw_score.cmp(&a.raw_score));
        }
        scored.truncate(self.config.batch_size);
        scored
    }

    /// Vote then comment for each batch member. A failed vote skips its comment;
    /// no failure stops the remaining candidates.
    async fn dispatch(&self, token: &AccessToken, batch: &VoteBatch, stats: &mut RunStats) {
        let agent = &self.config.agent;

        for candidate in &batch.candidates {
            let vote = VoteAction {
                voter: agent.clone(),
                author: candidate.author().to_string(),
                permlink: candidate.permlink().to_string(),
                weight: vote_weight(candidate.final_vote),
            };

            if let Err(e) = self.deps.dispatcher.vote(token, &vote).await {
                stats.votes_failed += 1;
                warn!(author = %vote.author, permlink = %vote.permlink, error = %e, "Vote failed");
                continue;
            }
            stats.votes_sent += 1;
            stats.budget_used += candidate.final_vote;
            info!(
                author = %vote.author,
                permlink = %vote.permlink,
                category = candidate.category.as_deref().unwrap_or_default(),
                final_vote = candidate.final_vote,
                "Voted"
            );

            let comment = CommentAction {
                parent_author: candidate.author().to_string(),
                parent_permlink: candidate.permlink().to_string(),
                author: agent.clone(),
                permlink: comment_permlink(candidate.author(), candidate.permlink(), Utc::now()),
                body: render_comment_body(
                    candidate.author(),
                    agent,
                    &candidate.achievements,
                    candidate.clamped_vote,
                ),
                metadata: comment_metadata(),
            };
            match self.deps.dispatcher.comment(token, &comment).await {
                Ok(()) => stats.comments_sent += 1,
                Err(e) => {
                    stats.comments_failed += 1;
                    warn!(author = %comment.parent_author, permlink = %comment.parent_permlink, error = %e, "Comment failed");
                }
            }
        }
    }

    fn enter(&self, run_id: &str, stage: RunStage) {
        info!(run_id = %run_id, stage = %stage, "Run stage");
    }
}
