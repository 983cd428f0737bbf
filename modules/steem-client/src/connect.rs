use serde::Serialize;
use serde_json::json;

use crate::error::{Result, SteemError};
use crate::types::{BroadcastResponse, TokenResponse};

/// Scopes requested when exchanging a refresh token.
const TOKEN_SCOPE: &str =
    "vote,comment,comment_delete,comment_options,custom_json,claim_reward_balance,offline";

#[derive(Debug, Clone, Serialize)]
pub struct VoteOperation {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    /// Basis points, -10000..=10000.
    pub weight: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentOperation {
    pub parent_author: String,
    pub parent_permlink: String,
    pub author: String,
    pub permlink: String,
    pub title: String,
    pub body: String,
    /// JSON-encoded metadata string, as the chain expects.
    pub json_metadata: String,
}

/// SteemConnect OAuth + broadcast client.
pub struct SteemConnect {
    client: reqwest::Client,
    host: String,
}

impl SteemConnect {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange a long-lived refresh token for a short-lived access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_secret: &str,
    ) -> Result<String> {
        let url = format!("{}/api/oauth2/token", self.host);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("refresh_token", refresh_token),
                ("client_secret", client_secret),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SteemError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = resp.json().await?;
        token.access_token.ok_or_else(|| {
            SteemError::Auth(
                token
                    .error_description
                    .unwrap_or_else(|| "no access_token in response".to_string()),
            )
        })
    }

    pub async fn vote(&self, access_token: &str, op: &VoteOperation) -> Result<()> {
        tracing::debug!(author = %op.author, permlink = %op.permlink, weight = op.weight, "broadcast vote");
        self.broadcast(access_token, json!([["vote", op]])).await
    }

    pub async fn comment(&self, access_token: &str, op: &CommentOperation) -> Result<()> {
        tracing::debug!(parent = %op.parent_permlink, permlink = %op.permlink, "broadcast comment");
        self.broadcast(access_token, json!([["comment", op]])).await
    }

    async fn broadcast(&self, access_token: &str, operations: serde_json::Value) -> Result<()> {
        let url = format!("{}/api/broadcast", self.host);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, access_token)
            .json(&json!({ "operations": operations }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SteemError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: BroadcastResponse = resp.json().await?;
        if let Some(err) = body.error {
            return Err(SteemError::Api {
                status: status.as_u16(),
                message: body.error_description.unwrap_or(err),
            });
        }
        Ok(())
    }
}
