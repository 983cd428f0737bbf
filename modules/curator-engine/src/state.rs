// Postgres-backed run state: the single-flight lease and category stats.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use curator_common::{CategoryStats, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::store::db_error;
use crate::traits::RunStateStore;

pub struct PgRunState {
    pool: PgPool,
}

impl PgRunState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStateStore for PgRunState {
    async fn try_acquire(&self, holder: &str, ttl: Duration) -> Result<bool> {
        // Reclaim a lease whose holder never released it
        let reclaimed = sqlx::query("DELETE FROM curator_lock WHERE expires_at < now()")
            .execute(&self.pool)
            .await
            .map_err(db_error)?
            .rows_affected();
        if reclaimed > 0 {
            warn!("Reclaimed expired curator lease");
        }

        let acquired = sqlx::query(
            r#"
            INSERT INTO curator_lock (id, holder, acquired_at, expires_at)
            VALUES (1, $1, now(), now() + make_interval(secs => $2))
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(holder)
        .bind(ttl.num_seconds() as f64)
        .execute(&self.pool)
        .await
        .map_err(db_error)?
        .rows_affected();

        Ok(acquired == 1)
    }

    async fn renew(&self, holder: &str, ttl: Duration) -> Result<bool> {
        let renewed = sqlx::query(
            "UPDATE curator_lock SET expires_at = now() + make_interval(secs => $2) WHERE holder = $1",
        )
        .bind(holder)
        .bind(ttl.num_seconds() as f64)
        .execute(&self.pool)
        .await
        .map_err(db_error)?
        .rows_affected();

        Ok(renewed == 1)
    }

    async fn release(&self, holder: &str) -> Result<()> {
        sqlx::query("DELETE FROM curator_lock WHERE holder = $1")
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn force_release(&self) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM curator_lock")
            .execute(&self.pool)
            .await
            .map_err(db_error)?
            .rows_affected();
        if removed > 0 {
            info!("Curator lease force-released");
        }
        Ok(removed > 0)
    }

    async fn category_stats(&self) -> Result<HashMap<String, CategoryStats>> {
        let rows = sqlx::query_as::<_, (String, f64, f64)>(
            "SELECT category, average_paid_authors, average_paid_curators FROM category_stats",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(category, authors, curators)| {
                (
                    category,
                    CategoryStats {
                        average_paid_authors: authors,
                        average_paid_curators: curators,
                    },
                )
            })
            .collect())
    }
}
