//! Per-candidate heuristic scoring.
//!
//! The score starts from rank consensus (how strongly non-automated upvoters
//! backed the contribution) and adds fixed bonuses for small audiences,
//! above-average rewards, first contributions, productivity and reputation.
//! The result is capped at 100 and rounded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use curator_common::{CategoryStats, Contribution, Result};
use tracing::{debug, info, warn};

use crate::allocation::AllocationContext;
use crate::lease::Lease;
use crate::retry::RetryPolicy;
use crate::traits::{AccountProvider, ContentRepository, ContributionFilter, FollowProvider};
use crate::types::Candidate;

pub const MAX_SCORE: f64 = 100.0;

/// Authors below this many followers get the discovery bonus.
pub const LOW_FOLLOWER_THRESHOLD: u64 = 500;
pub const LOW_FOLLOWER_BONUS: f64 = 20.0;
pub const REWARD_BONUS: f64 = 20.0;
pub const NEWCOMER_BONUS: f64 = 15.0;
pub const PRODUCTIVITY_BASE_BONUS: f64 = 5.0;
pub const PRODUCTIVITY_STEP_BONUS: f64 = 5.0;
pub const PRODUCTIVITY_MILESTONES: [u64; 4] = [15, 40, 60, 120];
pub const REPUTATION_STEP_BONUS: f64 = 2.5;
pub const REPUTATION_THRESHOLDS: [i64; 4] = [25, 50, 65, 70];
/// Rank consensus above this earns a (bonus-free) achievement.
pub const WOW_THRESHOLD: f64 = 55.0;

pub const ACHIEVEMENT_WOW: &str = "WOW WOW WOW People loved what you did here. GREAT JOB!";
pub const ACHIEVEMENT_LOW_FOLLOWERS: &str =
    "You have less than 500 followers. Just gave you a gift to help you succeed!";
pub const ACHIEVEMENT_REWARDS: &str =
    "You are generating more rewards than average for this category. Super!;)";
pub const ACHIEVEMENT_NEWCOMER: &str =
    "This is your first accepted contribution here in Utopian. Welcome!";
pub const ACHIEVEMENT_PRODUCTIVE: &str = "Seems like you contribute quite often. AMAZING!";

/// Rank consensus and the reward it is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Consensus {
    pub score: f64,
    pub generated_reward: f64,
}

/// Estimate how strongly the non-automated upvoters agree the contribution deserves reward.
///
/// Each upvote's effective weight is the larger of its declared percentage and
/// its estimated share of the total payout, so large accounts voting at low
/// percentages still count at their real impact.
pub fn rank_consensus(contribution: &Contribution, denylist: &HashSet<String>) -> Consensus {
    let votes: Vec<_> = contribution
        .active_votes
        .iter()
        .filter(|v| !denylist.contains(&v.voter))
        .collect();
    let upvotes: Vec<_> = votes.iter().filter(|v| v.is_upvote()).collect();

    let total_payout = contribution.total_payout();
    let vote_rshares: f64 = votes.iter().map(|v| v.rshares).sum();
    let ratio = if vote_rshares != 0.0 {
        total_payout / vote_rshares
    } else {
        0.0
    };

    let mut generated_reward = 0.0;
    let mut total_weight_percentage = 0.0;
    for upvote in &upvotes {
        let vote_value = upvote.rshares * ratio;
        let share_of_payout = if total_payout > 0.0 {
            vote_value / total_payout * 100.0
        } else {
            0.0
        };
        generated_reward += vote_value;
        total_weight_percentage += share_of_payout.max(upvote.percent);
    }

    let divisor = upvotes.len().max(1) as f64;
    let average_weight_percentage = total_weight_percentage / divisor / 100.0;
    let score = average_weight_percentage * upvotes.len() as f64 / 100.0;

    Consensus {
        score,
        generated_reward,
    }
}

/// Everything the bonus ladder needs about one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSignals {
    pub consensus: f64,
    pub generated_reward: f64,
    /// `None` when the category has no history; the reward bonus is then withheld.
    pub category_average_rewards: Option<f64>,
    pub follower_count: u64,
    pub prior_contributions: u64,
    pub reputation: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub final_score: u32,
    pub achievements: Vec<String>,
}

pub fn score(signals: &ScoreSignals) -> ScoreCard {
    let mut achievements = Vec::new();
    let mut total = signals.consensus;

    if signals.consensus > WOW_THRESHOLD {
        achievements.push(ACHIEVEMENT_WOW.to_string());
    }

    if signals.follower_count < LOW_FOLLOWER_THRESHOLD {
        total += LOW_FOLLOWER_BONUS;
        achievements.push(ACHIEVEMENT_LOW_FOLLOWERS.to_string());
    }

    if let Some(average) = signals.category_average_rewards {
        if signals.generated_reward > average {
            total += REWARD_BONUS;
            achievements.push(ACHIEVEMENT_REWARDS.to_string());
        }
    }

    if signals.prior_contributions == 0 {
        total += NEWCOMER_BONUS;
        achievements.push(ACHIEVEMENT_NEWCOMER.to_string());
    } else {
        total += PRODUCTIVITY_BASE_BONUS;
        total += PRODUCTIVITY_MILESTONES
            .iter()
            .filter(|&&m| signals.prior_contributions >= m)
            .count() as f64
            * PRODUCTIVITY_STEP_BONUS;
        achievements.push(ACHIEVEMENT_PRODUCTIVE.to_string());
    }

    total += REPUTATION_THRESHOLDS
        .iter()
        .filter(|&&t| signals.reputation >= t)
        .count() as f64
        * REPUTATION_STEP_BONUS;

    let final_score = if total >= MAX_SCORE {
        MAX_SCORE
    } else {
        total.round().max(0.0)
    };

    ScoreCard {
        final_score: final_score as u32,
        achievements,
    }
}

/// Runs the scoring stage: per-candidate lookups, one candidate at a time.
pub struct PostScorer {
    repository: Arc<dyn ContentRepository>,
    accounts: Arc<dyn AccountProvider>,
    follows: Arc<dyn FollowProvider>,
    retry: RetryPolicy,
    lookup_delay: Duration,
    denylist: HashSet<String>,
    lease: Option<Lease>,
}

impl PostScorer {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        accounts: Arc<dyn AccountProvider>,
        follows: Arc<dyn FollowProvider>,
        retry: RetryPolicy,
        lookup_delay: Duration,
        denylist: &[String],
    ) -> Self {
        Self {
            repository,
            accounts,
            follows,
            retry,
            lookup_delay,
            denylist: denylist.iter().cloned().collect(),
            lease: None,
        }
    }

    /// Renew `lease` before each candidate's lookups.
    pub fn with_lease(mut self, lease: Lease) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Score every candidate in order and record scores into `ctx`.
    ///
    /// Returns the scored candidates; unclassifiable ones are dropped. Any
    /// lookup failure that survives the retry policy aborts the whole stage.
    pub async fn score_all(
        &self,
        candidates: Vec<Candidate>,
        stats: &HashMap<String, CategoryStats>,
        ctx: &mut AllocationContext,
    ) -> Result<Vec<Candidate>> {
        let mut scored = Vec::with_capacity(candidates.len());

        for (i, mut candidate) in candidates.into_iter().enumerate() {
            if i > 0 && !self.lookup_delay.is_zero() {
                tokio::time::sleep(self.lookup_delay).await;
            }
            if let Some(lease) = &self.lease {
                lease.renew().await?;
            }

            let Some(category) = ctx
                .classifier()
                .classify(candidate.contribution_type())
                .map(|c| c.category.to_string())
            else {
                warn!(
                    author = candidate.author(),
                    permlink = candidate.permlink(),
                    contribution_type = candidate.contribution_type(),
                    "No category for contribution type, skipping"
                );
                continue;
            };

            let (card, generated_reward) = self.score_one(&candidate, &category, stats).await?;
            ctx.record_score(&category, card.final_score as f64)?;

            debug!(
                author = candidate.author(),
                permlink = candidate.permlink(),
                category = %category,
                score = card.final_score,
                "Scored candidate"
            );

            candidate.category = Some(category);
            candidate.raw_score = card.final_score;
            candidate.achievements = card.achievements;
            candidate.generated_reward = generated_reward;
            scored.push(candidate);
        }

        info!(scored = scored.len(), "Scoring complete");
        Ok(scored)
    }

    async fn score_one(
        &self,
        candidate: &Candidate,
        category: &str,
        stats: &HashMap<String, CategoryStats>,
    ) -> Result<(ScoreCard, f64)> {
        let author = candidate.author();

        let account = self
            .retry
            .run("get_account", || self.accounts.get_account(author))
            .await?;
        let followers = self
            .retry
            .run("get_follow_count", || self.follows.get_follow_count(author))
            .await?;
        let prior_filter = ContributionFilter::prior_contributions(author, candidate.contribution.id);
        let prior_contributions = self.repository.count(&prior_filter).await?;

        let consensus = rank_consensus(&candidate.contribution, &self.denylist);
        let category_average_rewards = stats
            .get(candidate.contribution_type())
            .or_else(|| stats.get(category))
            .map(CategoryStats::average_rewards);

        let card = score(&ScoreSignals {
            consensus: consensus.score,
            generated_reward: consensus.generated_reward,
            category_average_rewards,
            follower_count: followers.follower_count,
            prior_contributions,
            reputation: account.reputation,
        });
        Ok((card, consensus.generated_reward))
    }
}
