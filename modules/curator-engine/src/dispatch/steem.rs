use std::sync::Arc;

use async_trait::async_trait;
use curator_common::{CuratorError, Result};
use steem_client::{CommentOperation, SteemConnect, VoteOperation};
use tracing::warn;

use super::MAX_VOTE_WEIGHT;
use crate::traits::{AccessToken, ActionDispatcher, CommentAction, VoteAction};

/// Broadcasts votes and comments through SteemConnect.
pub struct SteemDispatcher {
    connect: Arc<SteemConnect>,
}

impl SteemDispatcher {
    pub fn new(connect: Arc<SteemConnect>) -> Self {
        Self { connect }
    }
}

#[async_trait]
impl ActionDispatcher for SteemDispatcher {
    async fn vote(&self, token: &AccessToken, vote: &VoteAction) -> Result<()> {
        let weight = if vote.weight > MAX_VOTE_WEIGHT {
            warn!(author = %vote.author, weight = vote.weight, "Vote weight above 100%, capping");
            MAX_VOTE_WEIGHT
        } else {
            vote.weight
        };

        let op = VoteOperation {
            voter: vote.voter.clone(),
            author: vote.author.clone(),
            permlink: vote.permlink.clone(),
            weight,
        };
        self.connect
            .vote(token.secret(), &op)
            .await
            .map_err(|e| CuratorError::provider("broadcast", e.is_transient(), e))
    }

    async fn comment(&self, token: &AccessToken, comment: &CommentAction) -> Result<()> {
        let op = CommentOperation {
            parent_author: comment.parent_author.clone(),
            parent_permlink: comment.parent_permlink.clone(),
            author: comment.author.clone(),
            permlink: comment.permlink.clone(),
            title: String::new(),
            body: comment.body.clone(),
            json_metadata: comment.metadata.to_string(),
        };
        self.connect
            .comment(token.secret(), &op)
            .await
            .map_err(|e| CuratorError::provider("broadcast", e.is_transient(), e))
    }
}
