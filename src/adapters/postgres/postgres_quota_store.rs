//! PostgreSQL implementation of QuotaStore.
//!
//! One row per user in `user_quotas`. The conditional counter write is a
//! single `UPDATE ... WHERE` on the expected counters, so the row lock taken
//! by the update is the serialization point.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::UserId;
use crate::domain::quota::{DeckCounters, UserQuotaRecord, UserType};
use crate::ports::{QuotaStore, StoreError};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user_quotas (
    user_id         TEXT PRIMARY KEY CHECK (user_id <> ''),
    user_type       TEXT NOT NULL CHECK (user_type IN ('free', 'super')),
    decks_created   BIGINT NOT NULL DEFAULT 0 CHECK (decks_created >= 0),
    decks_published BIGINT NOT NULL DEFAULT 0 CHECK (decks_published >= 0)
)
"#;

/// PostgreSQL implementation of the QuotaStore port.
pub struct PostgresQuotaStore {
    pool: PgPool,
}

impl PostgresQuotaStore {
    /// Creates a new PostgresQuotaStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration and wrap it.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to postgres: {}", e);
                StoreError::unavailable(e)
            })?;

        let store = Self::new(pool);
        if config.ensure_schema {
            store.ensure_schema().await?;
        }
        Ok(store)
    }

    /// Create the `user_quotas` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("create user_quotas", e))?;
        Ok(())
    }
}

/// Database row representation of a quota record.
#[derive(Debug, sqlx::FromRow)]
struct QuotaRow {
    user_id: String,
    user_type: String,
    decks_created: i64,
    decks_published: i64,
}

impl TryFrom<QuotaRow> for UserQuotaRecord {
    type Error = StoreError;

    fn try_from(row: QuotaRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id)
            .map_err(|e| StoreError::corrupt(format!("invalid user_id: {}", e)))?;
        let user_type = row
            .user_type
            .parse::<UserType>()
            .map_err(|_| StoreError::corrupt(format!("invalid user_type: {}", row.user_type)))?;
        let counters = DeckCounters::new(
            parse_count("decks_created", row.decks_created)?,
            parse_count("decks_published", row.decks_published)?,
        );
        Ok(UserQuotaRecord::from_parts(user_id, user_type, counters))
    }
}

fn parse_count(column: &str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::corrupt(format!("{} out of range: {}", column, value)))
}

fn db_error(op: &str, e: sqlx::Error) -> StoreError {
    tracing::error!(op = op, "Postgres query failed: {}", e);
    StoreError::unavailable(format!("failed to {}: {}", op, e))
}

#[async_trait]
impl QuotaStore for PostgresQuotaStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError> {
        let row: Option<QuotaRow> = sqlx::query_as(
            r#"
            SELECT user_id, user_type, decks_created, decks_published
            FROM user_quotas
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find quota record", e))?;

        row.map(UserQuotaRecord::try_from).transpose()
    }

    async fn put(&self, record: &UserQuotaRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_quotas (user_id, user_type, decks_created, decks_published)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.user_type.as_str())
        .bind(i64::from(record.decks_created()))
        .bind(i64::from(record.decks_published()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert quota record", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(record.user_id.clone()));
        }
        Ok(())
    }

    async fn update_counters(
        &self,
        user_id: &UserId,
        expected: DeckCounters,
        next: DeckCounters,
    ) -> Result<UserQuotaRecord, StoreError> {
        let row: Option<QuotaRow> = sqlx::query_as(
            r#"
            UPDATE user_quotas SET
                decks_created = $4,
                decks_published = $5
            WHERE user_id = $1 AND decks_created = $2 AND decks_published = $3
            RETURNING user_id, user_type, decks_created, decks_published
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(expected.decks_created))
        .bind(i64::from(expected.decks_published))
        .bind(i64::from(next.decks_created))
        .bind(i64::from(next.decks_published))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("update quota counters", e))?;

        match row {
            Some(row) => UserQuotaRecord::try_from(row),
            // Nothing matched: either the row is gone or the counters moved.
            None => match self.get(user_id).await? {
                Some(current) => Err(StoreError::Conflict {
                    current: current.counters,
                }),
                None => Err(StoreError::NotFound(user_id.clone())),
            },
        }
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_quotas WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete quota record", e))?;
        Ok(())
    }
}
