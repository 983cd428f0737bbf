use async_trait::async_trait;
use curator_common::Result;
use tracing::info;

use crate::traits::{AccessToken, ActionDispatcher, CommentAction, VoteAction};

/// Logs actions instead of broadcasting them.
pub struct LogDispatcher;

#[async_trait]
impl ActionDispatcher for LogDispatcher {
    async fn vote(&self, _token: &AccessToken, vote: &VoteAction) -> Result<()> {
        info!(
            voter = %vote.voter,
            author = %vote.author,
            permlink = %vote.permlink,
            weight = vote.weight,
            "[dry-run] vote"
        );
        Ok(())
    }

    async fn comment(&self, _token: &AccessToken, comment: &CommentAction) -> Result<()> {
        info!(
            parent_author = %comment.parent_author,
            parent_permlink = %comment.parent_permlink,
            permlink = %comment.permlink,
            body_len = comment.body.len(),
            "[dry-run] comment"
        );
        Ok(())
    }
}
