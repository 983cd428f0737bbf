use thiserror::Error;

pub type Result<T> = std::result::Result<T, SteemError>;

#[derive(Debug, Error)]
pub enum SteemError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Authorization error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SteemError {
    /// Failures worth retrying: network trouble, throttling, server-side errors,
    /// and content that has not propagated to the node yet.
    pub fn is_transient(&self) -> bool {
        match self {
            SteemError::Network(_) | SteemError::NotFound(_) => true,
            SteemError::Api { status, .. } => *status == 429 || *status >= 500,
            SteemError::Rpc { .. } | SteemError::Parse(_) | SteemError::Auth(_) => false,
        }
    }
}

impl From<reqwest::Error> for SteemError {
    fn from(err: reqwest::Error) -> Self {
        SteemError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SteemError {
    fn from(err: serde_json::Error) -> Self {
        SteemError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_throttling_are_transient() {
        assert!(SteemError::Api { status: 503, message: String::new() }.is_transient());
        assert!(SteemError::Api { status: 429, message: String::new() }.is_transient());
        assert!(!SteemError::Api { status: 400, message: String::new() }.is_transient());
        assert!(SteemError::Network("reset".into()).is_transient());
        assert!(!SteemError::Auth("expired".into()).is_transient());
    }
}
