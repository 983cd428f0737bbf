pub mod connect;
pub mod error;
pub mod reputation;
pub mod types;

pub use connect::{CommentOperation, SteemConnect, VoteOperation};
pub use error::{Result, SteemError};
pub use reputation::format_reputation;
pub use types::{json_number, parse_chain_time, Account, Content, FollowCount, Vote};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{RpcRequest, RpcResponse};

/// JSON-RPC client for a Steem API node.
pub struct SteemClient {
    client: reqwest::Client,
    url: String,
}

impl SteemClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn call<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: P) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let resp = self.client.post(&self.url).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SteemError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let rpc: RpcResponse<T> = resp.json().await?;
        if let Some(err) = rpc.error {
            return Err(SteemError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        rpc.result
            .ok_or_else(|| SteemError::Parse(format!("{method}: response has no result")))
    }

    pub async fn get_accounts(&self, names: &[&str]) -> Result<Vec<Account>> {
        tracing::debug!(?names, "get_accounts");
        self.call("condenser_api.get_accounts", (names,)).await
    }

    /// Fetch a single account, failing with `NotFound` if the node does not know it.
    pub async fn get_account(&self, name: &str) -> Result<Account> {
        let mut accounts = self.get_accounts(&[name]).await?;
        if accounts.len() != 1 {
            return Err(SteemError::NotFound(format!("account {name}")));
        }
        Ok(accounts.remove(0))
    }

    pub async fn get_follow_count(&self, name: &str) -> Result<FollowCount> {
        tracing::debug!(name, "get_follow_count");
        self.call("condenser_api.get_follow_count", (name,)).await
    }

    /// Fetch a post. The node answers unknown posts with an empty author.
    pub async fn get_content(&self, author: &str, permlink: &str) -> Result<Content> {
        tracing::debug!(author, permlink, "get_content");
        let content: Content = self
            .call("condenser_api.get_content", (author, permlink))
            .await?;
        if content.author.is_empty() {
            return Err(SteemError::NotFound(format!("content @{author}/{permlink}")));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_serializes_positional_params() {
        let req = RpcRequest {
            jsonrpc: "2.0",
            method: "condenser_api.get_content",
            params: ("alice", "hello"),
            id: 1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["params"], serde_json::json!(["alice", "hello"]));

        let names: &[&str] = &["alice"];
        let req = RpcRequest {
            jsonrpc: "2.0",
            method: "condenser_api.get_accounts",
            params: (names,),
            id: 1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["params"], serde_json::json!([["alice"]]));
    }
}
