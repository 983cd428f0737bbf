use thiserror::Error;

pub type Result<T> = std::result::Result<T, CuratorError>;

#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Allocation degenerate: total weighted demand is zero")]
    AllocationDegenerate,

    #[error("{provider} lookup failed: {message}")]
    Provider {
        provider: &'static str,
        transient: bool,
        message: String,
    },

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Curator lease lost to another run")]
    LeaseLost,
}

impl CuratorError {
    pub fn provider(provider: &'static str, transient: bool, err: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider,
            transient,
            message: err.to_string(),
        }
    }

    /// Whether retrying the failed operation may succeed.
    /// Only provider lookups flagged transient qualify; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider { transient: true, .. })
    }
}
