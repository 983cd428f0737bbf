// Postgres-backed contribution repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_common::{ActiveVote, Contribution, CuratorError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use crate::traits::{ContentRepository, ContributionFilter};

pub(crate) fn db_error(err: sqlx::Error) -> CuratorError {
    CuratorError::Database(err.to_string())
}

/// Every filter field maps to one positional parameter; NULL disables the clause.
const FILTER_CLAUSE: &str = r#"
    WHERE ($1 = FALSE OR reviewed)
      AND ($2::text IS NULL OR author = $2)
      AND ($3::text IS NULL OR author <> $3)
      AND ($4::text IS NULL OR NOT active_votes @> jsonb_build_array(jsonb_build_object('voter', $4::text)))
      AND ($5::bigint IS NULL OR id <> $5)
      AND ($6::timestamptz IS NULL OR created <= $6)
      AND ($7::timestamptz IS NULL OR cashout_time > $7)
"#;

#[derive(Debug, sqlx::FromRow)]
struct ContributionRow {
    id: i64,
    author: String,
    permlink: String,
    contribution_type: String,
    reviewed: bool,
    created: DateTime<Utc>,
    cashout_time: Option<DateTime<Utc>>,
    net_votes: i64,
    pending_payout_value: String,
    total_payout_value: String,
    curator_payout_value: String,
    active_votes: Json<Vec<ActiveVote>>,
}

impl From<ContributionRow> for Contribution {
    fn from(row: ContributionRow) -> Self {
        Contribution {
            id: row.id,
            author: row.author,
            permlink: row.permlink,
            contribution_type: row.contribution_type,
            reviewed: row.reviewed,
            created: row.created,
            cashout_time: row.cashout_time,
            net_votes: row.net_votes,
            pending_payout_value: row.pending_payout_value,
            total_payout_value: row.total_payout_value,
            curator_payout_value: row.curator_payout_value,
            active_votes: row.active_votes.0,
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(db_error)?;
        info!("Connected to Postgres");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CuratorError::Database(e.to_string()))?;
        Ok(())
    }
}

fn bind_filter<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    f: &'q ContributionFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    q.bind(f.reviewed_only)
        .bind(f.author.as_deref())
        .bind(f.exclude_author.as_deref())
        .bind(f.exclude_voter.as_deref())
        .bind(f.exclude_id)
        .bind(f.created_before)
        .bind(f.cashout_after)
}

#[async_trait]
impl ContentRepository for PgStore {
    async fn query(&self, filter: &ContributionFilter) -> Result<Vec<Contribution>> {
        let sql = format!(
            r#"
            SELECT id, author, permlink, contribution_type, reviewed, created, cashout_time,
                   net_votes, pending_payout_value, total_payout_value, curator_payout_value,
                   active_votes
            FROM contributions
            {FILTER_CLAUSE}
            ORDER BY net_votes DESC, id ASC
            "#
        );
        let rows = bind_filter(sqlx::query_as::<_, ContributionRow>(&sql), filter)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Contribution::from).collect())
    }

    async fn count(&self, filter: &ContributionFilter) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM contributions {FILTER_CLAUSE}");
        let (count,): (i64,) = bind_filter(sqlx::query_as::<_, (i64,)>(&sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(count.max(0) as u64)
    }
}
