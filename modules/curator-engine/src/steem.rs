//! Steem-backed implementations of the platform and authorization traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_common::{AccountInfo, ActiveVote, ContentState, CuratorError, FollowCount, Result};
use steem_client::{format_reputation, json_number, SteemClient, SteemConnect, SteemError};

use crate::traits::{AccessToken, AccountProvider, AuthProvider, ContentProvider, FollowProvider};

fn lookup_error(provider: &'static str, err: SteemError) -> CuratorError {
    CuratorError::provider(provider, err.is_transient(), err)
}

/// Account, follower and content lookups against a Steem node.
pub struct SteemProvider {
    client: SteemClient,
}

impl SteemProvider {
    pub fn new(client: SteemClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountProvider for SteemProvider {
    async fn get_account(&self, name: &str) -> Result<AccountInfo> {
        let account = self
            .client
            .get_account(name)
            .await
            .map_err(|e| lookup_error("accounts", e))?;

        Ok(AccountInfo {
            reputation: format_reputation(account.raw_reputation()),
            voting_power: account.voting_power,
            last_vote_time: account.last_vote_at().unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            name: account.name,
        })
    }
}

#[async_trait]
impl FollowProvider for SteemProvider {
    async fn get_follow_count(&self, name: &str) -> Result<FollowCount> {
        let count = self
            .client
            .get_follow_count(name)
            .await
            .map_err(|e| lookup_error("follows", e))?;

        Ok(FollowCount {
            follower_count: count.follower_count,
            following_count: count.following_count,
        })
    }
}

#[async_trait]
impl ContentProvider for SteemProvider {
    async fn get_content_state(&self, author: &str, permlink: &str) -> Result<ContentState> {
        let content = self
            .client
            .get_content(author, permlink)
            .await
            .map_err(|e| lookup_error("content", e))?;

        let cashout_time = content.cashout_at();
        let active_votes = content
            .active_votes
            .into_iter()
            .map(|v| ActiveVote {
                percent: json_number(&v.percent),
                rshares: json_number(&v.rshares),
                voter: v.voter,
            })
            .collect();

        Ok(ContentState {
            cashout_time,
            net_votes: content.net_votes,
            pending_payout_value: content.pending_payout_value,
            total_payout_value: content.total_payout_value,
            curator_payout_value: content.curator_payout_value,
            active_votes,
        })
    }
}

/// Refresh-token exchange against SteemConnect.
pub struct SteemConnectAuth {
    connect: Arc<SteemConnect>,
    refresh_token: String,
    client_secret: String,
}

impl SteemConnectAuth {
    pub fn new(connect: Arc<SteemConnect>, refresh_token: String, client_secret: String) -> Self {
        Self {
            connect,
            refresh_token,
            client_secret,
        }
    }
}

#[async_trait]
impl AuthProvider for SteemConnectAuth {
    async fn access_token(&self) -> Result<AccessToken> {
        self.connect
            .refresh_access_token(&self.refresh_token, &self.client_secret)
            .await
            .map(AccessToken::new)
            .map_err(|e| CuratorError::Auth(e.to_string()))
    }
}
