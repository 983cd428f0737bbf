// Trait abstractions for the engine's external collaborators.
//
// ContentRepository and RunStateStore are backed by Postgres (store.rs, state.rs).
// AccountProvider, FollowProvider and ContentProvider are backed by a Steem node
// (steem.rs). AuthProvider and ActionDispatcher wrap SteemConnect (dispatch/).
//
// Every trait has an in-memory mock in testing.rs so a full run can be driven
// without network or database.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use curator_common::{
    AccountInfo, CategoryStats, ContentState, Contribution, FollowCount, Result,
};

// ---------------------------------------------------------------------------
// ContributionFilter: the query shape shared by every repository backend
// ---------------------------------------------------------------------------

/// Conjunctive filter over stored contributions. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionFilter {
    pub reviewed_only: bool,
    pub author: Option<String>,
    pub exclude_author: Option<String>,
    /// Drop contributions this account already voted on.
    pub exclude_voter: Option<String>,
    pub exclude_id: Option<i64>,
    pub created_before: Option<DateTime<Utc>>,
    /// Keep only contributions whose payout window closes after this instant.
    pub cashout_after: Option<DateTime<Utc>>,
}

impl ContributionFilter {
    pub fn matches(&self, c: &Contribution) -> bool {
        (!self.reviewed_only || c.reviewed)
            && self.author.as_ref().map_or(true, |a| &c.author == a)
            && self.exclude_author.as_ref().map_or(true, |a| &c.author != a)
            && self.exclude_voter.as_ref().map_or(true, |v| !c.has_vote_from(v))
            && self.exclude_id.map_or(true, |id| c.id != id)
            && self.created_before.map_or(true, |t| c.created <= t)
            && self
                .cashout_after
                .map_or(true, |t| c.cashout_time.is_some_and(|ct| ct > t))
    }

    /// Reviewed contributions by `author` other than `contribution_id`.
    pub fn prior_contributions(author: &str, contribution_id: i64) -> Self {
        Self {
            reviewed_only: true,
            author: Some(author.to_string()),
            exclude_id: Some(contribution_id),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Repository + run state (Postgres)
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Matching contributions, ordered by net votes descending.
    async fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>>;

    async fn count(&self, filter: &ContributionFilter) -> Result<u64>;
}

/// External run state: the single-flight lease and the category statistics snapshot.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    /// Take the lease for `holder` unless a live lease exists. Expired leases are reclaimed.
    async fn try_acquire(&self, holder: &str, ttl: Duration) -> Result<bool>;

    /// Extend the lease held by `holder` to `ttl` from now. False if `holder`
    /// no longer owns it.
    async fn renew(&self, holder: &str, ttl: Duration) -> Result<bool>;

    /// Release the lease if `holder` still owns it.
    async fn release(&self, holder: &str) -> Result<()>;

    /// Drop any lease regardless of holder. Returns true if one existed.
    async fn force_release(&self) -> Result<bool>;

    /// Historical payout averages keyed by contribution type.
    async fn category_stats(&self) -> Result<HashMap<String, CategoryStats>>;
}

// ---------------------------------------------------------------------------
// Platform lookups (Steem node)
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn get_account(&self, name: &str) -> Result<AccountInfo>;
}

#[async_trait]
pub trait FollowProvider: Send + Sync {
    async fn get_follow_count(&self, name: &str) -> Result<FollowCount>;
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Live votes and payouts for a post.
    async fn get_content_state(&self, author: &str, permlink: &str) -> Result<ContentState>;
}

// ---------------------------------------------------------------------------
// Authorization + dispatch (SteemConnect)
// ---------------------------------------------------------------------------

/// Short-lived broadcast credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange the long-lived refresh credential for an access token.
    async fn access_token(&self) -> Result<AccessToken>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteAction {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    /// Basis points, 0..=10000.
    pub weight: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentAction {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub body: String,
    pub metadata: serde_json::Value,
}

/// Fire-and-forget delivery of curation actions.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn vote(&self, token: &AccessToken, vote: &VoteAction) -> Result<()>;

    async fn comment(&self, token: &AccessToken, comment: &CommentAction) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::contribution;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ContributionFilter::default().matches(&contribution(1, "alice")));
    }

    #[test]
    fn exclude_voter_drops_already_voted() {
        let filter = ContributionFilter {
            exclude_voter: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&contribution(1, "alice")));
    }

    #[test]
    fn cashout_after_drops_paid_out() {
        let mut c = contribution(1, "alice");
        c.cashout_time = None;
        let filter = ContributionFilter {
            cashout_after: Some(Utc::now()),
            ..Default::default()
        };
        assert!(!filter.matches(&c));
    }

    #[test]
    fn prior_contributions_excludes_the_candidate_itself() {
        let filter = ContributionFilter::prior_contributions("alice", 1);
        assert!(!filter.matches(&contribution(1, "alice")));
        assert!(filter.matches(&contribution(2, "alice")));
        assert!(!filter.matches(&contribution(3, "carol")));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AccessToken::new("abc")), "AccessToken(***)");
    }
}
