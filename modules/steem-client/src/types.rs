use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp the chain reports for content whose rewards were already paid.
pub const PAID_OUT_SENTINEL: &str = "1969-12-31T23:59:59";

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Subset of `condenser_api.get_accounts` fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    /// Raw reputation; nodes serialize it either as a number or a string.
    pub reputation: serde_json::Value,
    pub voting_power: i64,
    pub last_vote_time: String,
}

impl Account {
    pub fn raw_reputation(&self) -> i64 {
        match &self.reputation {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            serde_json::Value::String(s) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn last_vote_at(&self) -> Option<DateTime<Utc>> {
        parse_chain_time(&self.last_vote_time)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowCount {
    pub account: String,
    pub follower_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub percent: serde_json::Value,
    pub rshares: serde_json::Value,
}

/// Subset of `condenser_api.get_content` fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    pub id: i64,
    pub author: String,
    pub permlink: String,
    pub created: String,
    pub cashout_time: String,
    pub net_votes: i64,
    pub pending_payout_value: String,
    pub total_payout_value: String,
    pub curator_payout_value: String,
    #[serde(default)]
    pub active_votes: Vec<Vote>,
    #[serde(default)]
    pub json_metadata: String,
}

impl Content {
    /// `None` once rewards are paid out.
    pub fn cashout_at(&self) -> Option<DateTime<Utc>> {
        if self.cashout_time == PAID_OUT_SENTINEL {
            return None;
        }
        parse_chain_time(&self.cashout_time)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Chain timestamps carry no zone suffix and are always UTC.
pub fn parse_chain_time(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ndt| ndt.and_utc())
}

/// Read a JSON number that may have been serialized as a string.
pub fn json_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_out_content_has_no_cashout() {
        let content: Content = serde_json::from_value(serde_json::json!({
            "id": 7,
            "author": "alice",
            "permlink": "hello",
            "created": "2018-01-01T00:00:00",
            "cashout_time": PAID_OUT_SENTINEL,
            "net_votes": 3,
            "pending_payout_value": "0.000 SBD",
            "total_payout_value": "1.000 SBD",
            "curator_payout_value": "0.250 SBD",
            "active_votes": [{"voter": "bob", "percent": 10000, "rshares": "5000"}]
        }))
        .unwrap();
        assert!(content.cashout_at().is_none());
        assert_eq!(json_number(&content.active_votes[0].rshares), 5000.0);
    }

    #[test]
    fn reputation_accepts_string_or_number() {
        let a: Account = serde_json::from_value(serde_json::json!({
            "name": "a", "reputation": "95832978796820",
            "voting_power": 9800, "last_vote_time": "2018-01-01T00:00:00"
        }))
        .unwrap();
        assert_eq!(a.raw_reputation(), 95832978796820);
        assert!(a.last_vote_at().is_some());
    }
}
