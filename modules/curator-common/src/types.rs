use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single vote cast on a contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveVote {
    pub voter: String,
    /// Declared vote strength in basis points (10000 = 100%). Negative for downvotes.
    #[serde(deserialize_with = "number_or_string")]
    pub percent: f64,
    /// Reward shares contributed by this vote.
    #[serde(deserialize_with = "number_or_string")]
    pub rshares: f64,
}

impl ActiveVote {
    pub fn is_upvote(&self) -> bool {
        self.percent > 0.0
    }
}

/// A reviewed contribution as stored by the content repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: i64,
    pub author: String,
    pub permlink: String,
    /// Raw contribution type, e.g. `development` or `task-analysis`.
    pub contribution_type: String,
    /// Accepted by a moderator.
    pub reviewed: bool,
    pub created: DateTime<Utc>,
    /// `None` once rewards have been paid out.
    pub cashout_time: Option<DateTime<Utc>>,
    pub net_votes: i64,
    pub pending_payout_value: String,
    pub total_payout_value: String,
    pub curator_payout_value: String,
    pub active_votes: Vec<ActiveVote>,
}

impl Contribution {
    /// Pending plus already paid author and curator rewards.
    pub fn total_payout(&self) -> f64 {
        parse_asset(&self.pending_payout_value)
            + parse_asset(&self.total_payout_value)
            + parse_asset(&self.curator_payout_value)
    }

    pub fn has_vote_from(&self, account: &str) -> bool {
        self.active_votes.iter().any(|v| v.voter == account)
    }

    /// Overwrite vote and payout fields with freshly fetched platform state.
    pub fn apply_state(&mut self, state: ContentState) {
        self.cashout_time = state.cashout_time;
        self.net_votes = state.net_votes;
        self.pending_payout_value = state.pending_payout_value;
        self.total_payout_value = state.total_payout_value;
        self.curator_payout_value = state.curator_payout_value;
        self.active_votes = state.active_votes;
    }
}

/// Live vote and payout state for a contribution, as reported by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentState {
    pub cashout_time: Option<DateTime<Utc>>,
    pub net_votes: i64,
    pub pending_payout_value: String,
    pub total_payout_value: String,
    pub curator_payout_value: String,
    pub active_votes: Vec<ActiveVote>,
}

/// Account metadata needed for scoring and the voting-power gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub name: String,
    /// Display reputation (the 25-based score, not the raw platform value).
    pub reputation: i64,
    /// Voting power in basis points at the time of the last vote.
    pub voting_power: i64,
    pub last_vote_time: DateTime<Utc>,
}

/// Seconds for voting power to regenerate from 0 to 100%.
pub const VOTING_POWER_REGEN_SECS: f64 = 432_000.0;
/// Full voting power in basis points.
pub const FULL_VOTING_POWER: f64 = 10_000.0;

impl AccountInfo {
    /// Voting power regenerated up to `now`, in basis points (may exceed 10000).
    pub fn current_voting_power(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - self.last_vote_time).num_milliseconds() as f64 / 1000.0;
        self.voting_power as f64 + FULL_VOTING_POWER * elapsed / VOTING_POWER_REGEN_SECS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowCount {
    pub follower_count: u64,
    pub following_count: u64,
}

/// Historical payout averages for a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub average_paid_authors: f64,
    pub average_paid_curators: f64,
}

impl CategoryStats {
    pub fn average_rewards(&self) -> f64 {
        self.average_paid_authors + self.average_paid_curators
    }
}

/// Parse the numeric part of an asset string such as `"1.234 SBD"`.
/// Unparsable values count as zero.
pub fn parse_asset(value: &str) -> f64 {
    value
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
