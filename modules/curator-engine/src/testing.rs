// Test mocks for the curation engine.
//
// One mock per trait boundary:
// - MockRepository (ContentRepository): fixed Vec of stored contributions
// - MockPlatform (AccountProvider, FollowProvider, ContentProvider): HashMap-based
//   lookups with injectable transient failures
// - MockAuth (AuthProvider): fixed token or failure
// - RecordingDispatcher (ActionDispatcher): records every action, optional failures
// - MemoryRunState (RunStateStore): in-memory lease (with renewal) and category stats
//
// Plus `contribution()` for building a stored contribution that passes every
// eligibility check.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use curator_common::{
    AccountInfo, ActiveVote, CategoryStats, ContentState, Contribution, CuratorError, FollowCount,
    Result,
};

use crate::traits::{
    AccessToken, AccountProvider, ActionDispatcher, AuthProvider, CommentAction, ContentProvider,
    ContentRepository, ContributionFilter, FollowProvider, RunStateStore, VoteAction,
};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A reviewed `development` contribution, 12h old, paying out in 3 days,
/// with one full upvote from `bob`.
pub fn contribution(id: i64, author: &str) -> Contribution {
    Contribution {
        id,
        author: author.to_string(),
        permlink: format!("post-{id}"),
        contribution_type: "development".to_string(),
        reviewed: true,
        created: Utc::now() - Duration::hours(12),
        cashout_time: Some(Utc::now() + Duration::days(3)),
        net_votes: 1,
        pending_payout_value: "0.000 SBD".to_string(),
        total_payout_value: "0.000 SBD".to_string(),
        curator_payout_value: "0.000 SBD".to_string(),
        active_votes: vec![ActiveVote {
            voter: "bob".to_string(),
            percent: 10000.0,
            rshares: 100.0,
        }],
    }
}

pub fn content_state(c: &Contribution) -> ContentState {
    ContentState {
        cashout_time: c.cashout_time,
        net_votes: c.net_votes,
        pending_payout_value: c.pending_payout_value.clone(),
        total_payout_value: c.total_payout_value.clone(),
        curator_payout_value: c.curator_payout_value.clone(),
        active_votes: c.active_votes.clone(),
    }
}

pub fn account(name: &str, reputation: i64) -> AccountInfo {
    AccountInfo {
        name: name.to_string(),
        reputation,
        voting_power: 10000,
        last_vote_time: Utc::now() - Duration::days(1),
    }
}

// ---------------------------------------------------------------------------
// MockRepository
// ---------------------------------------------------------------------------

pub struct MockRepository {
    contributions: Vec<Contribution>,
}

impl MockRepository {
    pub fn new(contributions: Vec<Contribution>) -> Self {
        Self { contributions }
    }
}

#[async_trait]
impl ContentRepository for MockRepository {
    async fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>> {
        let mut out: Vec<Contribution> = self
            .contributions
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.net_votes.cmp(&a.net_votes));
        Ok(out)
    }

    async fn count(&self, filter: &ContributionFilter) -> Result<u64> {
        Ok(self.contributions.iter().filter(|c| filter.matches(c)).count() as u64)
    }
}

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

/// Unregistered accounts resolve to reputation 25 with no followers.
/// Unregistered content is a permanent "not found" error.
pub struct MockPlatform {
    accounts: HashMap<String, AccountInfo>,
    followers: HashMap<String, u64>,
    contents: HashMap<(String, String), ContentState>,
    failing_accounts: HashSet<String>,
    account_failures: Mutex<HashMap<String, u32>>,
    follow_failures: Mutex<HashMap<String, u32>>,
    content_failures: Mutex<HashMap<String, u32>>,
    content_calls: Mutex<HashMap<String, u32>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            followers: HashMap::new(),
            contents: HashMap::new(),
            failing_accounts: HashSet::new(),
            account_failures: Mutex::new(HashMap::new()),
            follow_failures: Mutex::new(HashMap::new()),
            content_failures: Mutex::new(HashMap::new()),
            content_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.accounts.insert(account.name.clone(), account);
        self
    }

    pub fn with_followers(mut self, name: &str, count: u64) -> Self {
        self.followers.insert(name.to_string(), count);
        self
    }

    /// Serve each contribution's current fields as its live state.
    pub fn with_contents_from(mut self, contributions: &[Contribution]) -> Self {
        for c in contributions {
            self.contents
                .insert((c.author.clone(), c.permlink.clone()), content_state(c));
        }
        self
    }

    /// Every account lookup for `name` fails transiently.
    pub fn fail_account(mut self, name: &str) -> Self {
        self.failing_accounts.insert(name.to_string());
        self
    }

    /// The first `times` account lookups for `name` fail transiently.
    pub fn fail_account_times(self, name: &str, times: u32) -> Self {
        self.account_failures
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
        self
    }

    /// The first `times` follower lookups for `name` fail transiently.
    pub fn fail_follows_times(self, name: &str, times: u32) -> Self {
        self.follow_failures
            .lock()
            .unwrap()
            .insert(name.to_string(), times);
        self
    }

    /// The first `times` content lookups for `author` fail transiently.
    pub fn fail_content(self, author: &str, times: u32) -> Self {
        self.content_failures
            .lock()
            .unwrap()
            .insert(author.to_string(), times);
        self
    }

    pub fn content_calls(&self, author: &str) -> u32 {
        self.content_calls
            .lock()
            .unwrap()
            .get(author)
            .copied()
            .unwrap_or(0)
    }
}

/// Consume one scheduled failure for `key`, if any remain.
fn take_failure(failures: &Mutex<HashMap<String, u32>>, key: &str) -> bool {
    let mut failures = failures.lock().unwrap();
    match failures.get_mut(key) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountProvider for MockPlatform {
    async fn get_account(&self, name: &str) -> Result<AccountInfo> {
        if self.failing_accounts.contains(name) || take_failure(&self.account_failures, name) {
            return Err(CuratorError::provider("accounts", true, "MockPlatform: account lookup down"));
        }
        Ok(self
            .accounts
            .get(name)
            .cloned()
            .unwrap_or_else(|| account(name, 25)))
    }
}

#[async_trait]
impl FollowProvider for MockPlatform {
    async fn get_follow_count(&self, name: &str) -> Result<FollowCount> {
        if take_failure(&self.follow_failures, name) {
            return Err(CuratorError::provider("follows", true, "MockPlatform: follow API down"));
        }
        Ok(FollowCount {
            follower_count: self.followers.get(name).copied().unwrap_or(0),
            following_count: 0,
        })
    }
}

#[async_trait]
impl ContentProvider for MockPlatform {
    async fn get_content_state(&self, author: &str, permlink: &str) -> Result<ContentState> {
        *self
            .content_calls
            .lock()
            .unwrap()
            .entry(author.to_string())
            .or_insert(0) += 1;

        if take_failure(&self.content_failures, author) {
            return Err(CuratorError::provider("content", true, "MockPlatform: node timeout"));
        }

        self.contents
            .get(&(author.to_string(), permlink.to_string()))
            .cloned()
            .ok_or_else(|| {
                CuratorError::provider(
                    "content",
                    false,
                    format!("MockPlatform: no content registered for {author}/{permlink}"),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// MockAuth
// ---------------------------------------------------------------------------

pub struct MockAuth {
    token: Option<String>,
}

impl MockAuth {
    pub fn ok() -> Self {
        Self {
            token: Some("test-token".to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn access_token(&self) -> Result<AccessToken> {
        self.token
            .as_ref()
            .map(AccessToken::new)
            .ok_or_else(|| CuratorError::Auth("MockAuth: refresh token rejected".to_string()))
    }
}

// ---------------------------------------------------------------------------
// RecordingDispatcher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingDispatcher {
    votes: Mutex<Vec<VoteAction>>,
    comments: Mutex<Vec<CommentAction>>,
    failing_votes: HashSet<String>,
    failing_comments: HashSet<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Votes on posts by `author` are rejected.
    pub fn fail_votes_for(mut self, author: &str) -> Self {
        self.failing_votes.insert(author.to_string());
        self
    }

    /// Comments under posts by `author` are rejected.
    pub fn fail_comments_for(mut self, author: &str) -> Self {
        self.failing_comments.insert(author.to_string());
        self
    }

    pub fn votes(&self) -> Vec<VoteAction> {
        self.votes.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<CommentAction> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionDispatcher for RecordingDispatcher {
    async fn vote(&self, _token: &AccessToken, vote: &VoteAction) -> Result<()> {
        if self.failing_votes.contains(&vote.author) {
            return Err(CuratorError::provider("broadcast", false, "RecordingDispatcher: vote rejected"));
        }
        self.votes.lock().unwrap().push(vote.clone());
        Ok(())
    }

    async fn comment(&self, _token: &AccessToken, comment: &CommentAction) -> Result<()> {
        if self.failing_comments.contains(&comment.parent_author) {
            return Err(CuratorError::provider(
                "broadcast",
                false,
                "RecordingDispatcher: comment rejected",
            ));
        }
        self.comments.lock().unwrap().push(comment.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryRunState
// ---------------------------------------------------------------------------

struct Lease {
    holder: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryRunState {
    lease: Mutex<Option<Lease>>,
    stats: HashMap<String, CategoryStats>,
}

impl MemoryRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(mut self, category: &str, stats: CategoryStats) -> Self {
        self.stats.insert(category.to_string(), stats);
        self
    }

    /// Pre-seed a lease as if another run held it, expiring at `expires_at`.
    pub fn held_by(self, holder: &str, expires_at: DateTime<Utc>) -> Self {
        *self.lease.lock().unwrap() = Some(Lease {
            holder: holder.to_string(),
            expires_at,
        });
        self
    }

    pub fn holder(&self) -> Option<String> {
        self.lease.lock().unwrap().as_ref().map(|l| l.holder.clone())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lease.lock().unwrap().as_ref().map(|l| l.expires_at)
    }
}

#[async_trait]
impl RunStateStore for MemoryRunState {
    async fn try_acquire(&self, holder: &str, ttl: Duration) -> Result<bool> {
        let now = Utc::now();
        let mut lease = self.lease.lock().unwrap();
        if lease.as_ref().is_some_and(|l| l.expires_at > now) {
            return Ok(false);
        }
        *lease = Some(Lease {
            holder: holder.to_string(),
            expires_at: now + ttl,
        });
        Ok(true)
    }

    async fn renew(&self, holder: &str, ttl: Duration) -> Result<bool> {
        let mut lease = self.lease.lock().unwrap();
        match lease.as_mut() {
            Some(l) if l.holder == holder => {
                l.expires_at = Utc::now() + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, holder: &str) -> Result<()> {
        let mut lease = self.lease.lock().unwrap();
        if lease.as_ref().is_some_and(|l| l.holder == holder) {
            *lease = None;
        }
        Ok(())
    }

    async fn force_release(&self) -> Result<bool> {
        Ok(self.lease.lock().unwrap().take().is_some())
    }

    async fn category_stats(&self) -> Result<HashMap<String, CategoryStats>> {
        Ok(self.stats.clone())
    }
}
