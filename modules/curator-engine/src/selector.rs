use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use curator_common::Result;
use tracing::{debug, info, warn};

use crate::lease::Lease;
use crate::retry::RetryPolicy;
use crate::traits::{ContentProvider, ContentRepository, ContributionFilter};
use crate::types::Candidate;

/// Which contributions the agent may act on at `now`.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    pub agent: String,
    pub min_age: Duration,
    pub now: DateTime<Utc>,
}

impl EligibilityFilter {
    pub fn new(agent: &str, min_age: Duration, now: DateTime<Utc>) -> Self {
        Self {
            agent: agent.to_string(),
            min_age,
            now,
        }
    }

    /// Reviewed, not authored or already voted by the agent, old enough, still paying out.
    pub fn to_query(&self) -> ContributionFilter {
        ContributionFilter {
            reviewed_only: true,
            exclude_author: Some(self.agent.clone()),
            exclude_voter: Some(self.agent.clone()),
            created_before: Some(self.now - self.min_age),
            cashout_after: Some(self.now),
            ..Default::default()
        }
    }
}

/// Fetches eligible contributions and refreshes their live state.
pub struct CandidateSelector {
    repository: Arc<dyn ContentRepository>,
    content: Arc<dyn ContentProvider>,
    retry: RetryPolicy,
    lease: Option<Lease>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub stored: usize,
    pub dropped: usize,
}

impl CandidateSelector {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        content: Arc<dyn ContentProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repository,
            content,
            retry,
            lease: None,
        }
    }

    /// Renew `lease` before each content refresh.
    pub fn with_lease(mut self, lease: Lease) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Eligible candidates ordered by net votes, descending. Empty is a normal result.
    ///
    /// A candidate whose live state cannot be fetched within the retry budget,
    /// or which is no longer eligible once refreshed, is dropped. Losing the
    /// lease is fatal.
    pub async fn select(&self, filter: &EligibilityFilter) -> Result<(Vec<Candidate>, Selection)> {
        let query = filter.to_query();
        let stored = self.repository.query(&query).await?;
        let mut selection = Selection {
            stored: stored.len(),
            dropped: 0,
        };
        info!(count = stored.len(), "Stored contributions matching eligibility");

        let mut candidates = Vec::with_capacity(stored.len());
        for mut contribution in stored {
            let author = contribution.author.clone();
            let permlink = contribution.permlink.clone();

            if let Some(lease) = &self.lease {
                lease.renew().await?;
            }

            let state = self
                .retry
                .run("get_content", || {
                    self.content.get_content_state(&author, &permlink)
                })
                .await;

            match state {
                Ok(state) => contribution.apply_state(state),
                Err(e) => {
                    warn!(author = %author, permlink = %permlink, error = %e, "Content lookup failed, dropping candidate");
                    selection.dropped += 1;
                    continue;
                }
            }

            if !query.matches(&contribution) {
                debug!(author = %author, permlink = %permlink, "No longer eligible after refresh");
                selection.dropped += 1;
                continue;
            }

            candidates.push(Candidate::new(contribution));
        }

        candidates.sort_by(|a, b| b.contribution.net_votes.cmp(&a.contribution.net_votes));
        Ok((candidates, selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{contribution, MemoryRunState, MockPlatform, MockRepository};
    use curator_common::ActiveVote;

    fn filter() -> EligibilityFilter {
        EligibilityFilter::new("curator", Duration::hours(6), Utc::now())
    }

    #[test]
    fn query_encodes_every_eligibility_rule() {
        let f = filter();
        let q = f.to_query();
        assert!(q.reviewed_only);
        assert_eq!(q.exclude_author.as_deref(), Some("curator"));
        assert_eq!(q.exclude_voter.as_deref(), Some("curator"));
        assert_eq!(q.created_before, Some(f.now - Duration::hours(6)));
        assert_eq!(q.cashout_after, Some(f.now));
    }

    #[tokio::test]
    async fn too_young_and_own_posts_are_excluded() {
        let mut young = contribution(2, "bob");
        young.created = Utc::now() - Duration::hours(1);
        let own = contribution(3, "curator");
        let ok = contribution(1, "alice");

        let repo = Arc::new(MockRepository::new(vec![ok.clone(), young, own]));
        let platform = Arc::new(MockPlatform::new().with_contents_from(&[ok]));
        let selector = CandidateSelector::new(repo, platform, RetryPolicy::no_retry());

        let (candidates, selection) = selector.select(&filter()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].author(), "alice");
        assert_eq!(selection.dropped, 0);
    }

    #[tokio::test]
    async fn refreshed_vote_from_agent_drops_candidate() {
        let c = contribution(1, "alice");
        let mut live = c.clone();
        live.active_votes.push(ActiveVote {
            voter: "curator".into(),
            percent: 1000.0,
            rshares: 1.0,
        });
        let repo = Arc::new(MockRepository::new(vec![c]));
        let platform = Arc::new(MockPlatform::new().with_contents_from(&[live]));
        let selector = CandidateSelector::new(repo, platform, RetryPolicy::no_retry());

        let (candidates, selection) = selector.select(&filter()).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(selection.dropped, 1);
    }

    #[tokio::test]
    async fn content_lookup_retries_then_drops() {
        let flaky = contribution(1, "alice");
        let dead = contribution(2, "bob");
        let repo = Arc::new(MockRepository::new(vec![flaky.clone(), dead.clone()]));
        let platform = Arc::new(
            MockPlatform::new()
                .with_contents_from(&[flaky, dead])
                .fail_content("alice", 9)
                .fail_content("bob", 10),
        );
        let selector = CandidateSelector::new(
            repo,
            platform.clone(),
            RetryPolicy::content_lookup().without_delay(),
        );

        let (candidates, selection) = selector.select(&filter()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].author(), "alice");
        assert_eq!(selection.dropped, 1);
        assert_eq!(platform.content_calls("alice"), 10);
        assert_eq!(platform.content_calls("bob"), 10);
    }

    #[tokio::test]
    async fn empty_repository_is_not_an_error() {
        let repo = Arc::new(MockRepository::new(vec![]));
        let platform = Arc::new(MockPlatform::new());
        let selector = CandidateSelector::new(repo, platform, RetryPolicy::no_retry());
        let (candidates, _) = selector.select(&filter()).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn candidates_are_ordered_by_refreshed_net_votes() {
        let mut a = contribution(1, "alice");
        a.net_votes = 10;
        let mut b = contribution(2, "bob");
        b.net_votes = 5;
        let mut b_live = b.clone();
        b_live.net_votes = 50;

        let repo = Arc::new(MockRepository::new(vec![a.clone(), b]));
        let platform = Arc::new(MockPlatform::new().with_contents_from(&[a, b_live]));
        let selector = CandidateSelector::new(repo, platform, RetryPolicy::no_retry());

        let (candidates, _) = selector.select(&filter()).await.unwrap();
        assert_eq!(candidates[0].author(), "bob");
        assert_eq!(candidates[1].author(), "alice");
    }

    #[tokio::test]
    async fn lease_is_renewed_while_refreshing() {
        let c = contribution(1, "alice");
        let repo = Arc::new(MockRepository::new(vec![c.clone()]));
        let platform = Arc::new(MockPlatform::new().with_contents_from(&[c]));
        let state = Arc::new(MemoryRunState::new().held_by("this-run", Utc::now()));
        let selector = CandidateSelector::new(repo, platform, RetryPolicy::no_retry())
            .with_lease(Lease::new(state.clone(), "this-run", Duration::minutes(30)));

        let (candidates, _) = selector.select(&filter()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(state.expires_at().unwrap() > Utc::now() + Duration::minutes(29));
    }

    #[tokio::test]
    async fn lost_lease_stops_selection() {
        let c = contribution(1, "alice");
        let repo = Arc::new(MockRepository::new(vec![c.clone()]));
        let platform = Arc::new(MockPlatform::new().with_contents_from(&[c]));
        let state = Arc::new(MemoryRunState::new().held_by("other-run", Utc::now() + Duration::minutes(5)));
        let selector = CandidateSelector::new(repo, platform.clone(), RetryPolicy::no_retry())
            .with_lease(Lease::new(state, "this-run", Duration::minutes(30)));

        let result = selector.select(&filter()).await;
        assert!(matches!(result, Err(curator_common::CuratorError::LeaseLost)));
        assert_eq!(platform.content_calls("alice"), 0);
    }
}
