use std::sync::Arc;

use chrono::Duration;
use curator_common::{CuratorError, Result};
use tracing::{debug, error};

use crate::traits::RunStateStore;

/// A held single-flight lease. Long stages call [`Lease::renew`] between units
/// of work so the lease never expires under a live run.
#[derive(Clone)]
pub struct Lease {
    store: Arc<dyn RunStateStore>,
    holder: String,
    ttl: Duration,
}

impl Lease {
    pub fn new(store: Arc<dyn RunStateStore>, holder: &str, ttl: Duration) -> Self {
        Self {
            store,
            holder: holder.to_string(),
            ttl,
        }
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Push the expiry out by the TTL. Fails with [`CuratorError::LeaseLost`]
    /// once another run owns the lease.
    pub async fn renew(&self) -> Result<()> {
        if self.store.renew(&self.holder, self.ttl).await? {
            debug!(holder = %self.holder, "Lease renewed");
            Ok(())
        } else {
            error!(holder = %self.holder, "Lease held by another run");
            Err(CuratorError::LeaseLost)
        }
    }
}
