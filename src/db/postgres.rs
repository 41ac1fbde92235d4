// PostgreSQL backend for posts, configuration rows, the registry row and
// the audit log.
//
// Queries are bound at runtime through sqlx_core, so building never needs a
// live DATABASE_URL. Timestamps are TIMESTAMPTZ and audit metadata is JSONB.
// LIKE is case-sensitive, so the http and @ exclusions match exactly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::Postgres;

use super::models::{LogEntry, LogLevel, NewPost, PostQuery};
use super::traits::Database;

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<Postgres>;

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connect to PostgreSQL and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await.with_context(|| {
            format!(
                "Failed to connect to PostgreSQL at {}",
                crate::config::redact_url(database_url)
            )
        })?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending migrations.
    ///
    /// Holds a session-level advisory lock on a dedicated connection so two
    /// instances starting together don't race to apply the same migration.
    /// The unlock always runs, even when a migration fails.
    async fn run_migrations(&self) -> Result<()> {
        // ASCII "MURMURDB" as a big-endian i64.
        const MIGRATION_LOCK_KEY: i64 = 0x4D55524D55524442_u64 as i64;

        let mut lock_conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for migration advisory lock")?;

        sqlx_core::query::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to acquire migration advisory lock")?;

        let migration_result: Result<()> = async {
            sqlx_core::query::query(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
            )
            .execute(&self.pool)
            .await?;

            let migrations = [(
                1,
                include_str!("../../migrations/postgres/0001_initial.sql"),
            )];

            for (version, sql) in migrations {
                let applied: bool = sqlx_core::query::query(
                    "SELECT COUNT(*) > 0 FROM schema_version WHERE version = $1",
                )
                .bind(version)
                .fetch_one(&self.pool)
                .await
                .map(|row| row.get::<bool, _>(0))
                .unwrap_or(false);

                if !applied {
                    let mut tx = self.pool.begin().await?;
                    sqlx_core::raw_sql::raw_sql(sql).execute(&mut *tx).await?;
                    tx.commit().await?;
                }
            }

            Ok(())
        }
        .await;

        let unlock_result = sqlx_core::query::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to release migration advisory lock");

        // Migration error takes priority over unlock error.
        migration_result?;
        unlock_result?;

        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn table_count(&self) -> Result<i64> {
        let row = sqlx_core::query::query(
            "SELECT COUNT(*)::bigint FROM information_schema.tables
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn insert_post(&self, post: &NewPost) -> Result<i64> {
        let row = sqlx_core::query::query(
            "INSERT INTO observations (user_name, instance_name, post_text, observed_at)
             VALUES ($1, $2, $3, COALESCE($4, NOW()))
             RETURNING id",
        )
        .bind(&post.user_name)
        .bind(&post.instance_name)
        .bind(&post.text)
        .bind(post.observed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn fetch_post_texts(&self, query: &PostQuery) -> Result<Vec<String>> {
        let min_length = i32::try_from(query.min_length).context("min_length exceeds i32 range")?;
        let limit = i64::from(query.limit);

        let rows = match query.within_hours {
            Some(hours) => {
                sqlx_core::query::query(
                    "SELECT post_text FROM observations
                     WHERE post_text IS NOT NULL
                       AND length(post_text) >= $1
                       AND post_text NOT LIKE '%http%'
                       AND post_text NOT LIKE '%@%'
                       AND observed_at >= NOW() - make_interval(hours => $2)
                     ORDER BY observed_at DESC, id DESC
                     LIMIT $3",
                )
                .bind(min_length)
                .bind(i32::try_from(hours).context("window exceeds i32 range")?)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx_core::query::query(
                    "SELECT post_text FROM observations
                     WHERE post_text IS NOT NULL
                       AND length(post_text) >= $1
                       AND post_text NOT LIKE '%http%'
                       AND post_text NOT LIKE '%@%'
                     LIMIT $2",
                )
                .bind(min_length)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(|r| r.get::<String, _>(0)).collect())
    }

    async fn count_posts(&self, within_hours: Option<u32>) -> Result<i64> {
        let row = match within_hours {
            Some(hours) => {
                sqlx_core::query::query(
                    "SELECT COUNT(*)::bigint FROM observations
                     WHERE observed_at >= NOW() - make_interval(hours => $1)",
                )
                .bind(i32::try_from(hours).context("window exceeds i32 range")?)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx_core::query::query("SELECT COUNT(*)::bigint FROM observations")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.get::<i64, _>(0))
    }

    async fn clear_posts(&self) -> Result<u64> {
        let result = sqlx_core::query::query("DELETE FROM observations")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx_core::query::query("SELECT value FROM note_text WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get::<Option<String>, _>(0)))
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx_core::query::query(
            "INSERT INTO note_text (key, value, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT(key) DO UPDATE SET value = $2, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_memo(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx_core::query::query("SELECT value FROM memorandum WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn set_memo(&self, key: &str, value: &str) -> Result<()> {
        sqlx_core::query::query(
            "INSERT INTO memorandum (key, value, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT(key) DO UPDATE SET value = $2, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_log(&self, entry: &LogEntry) -> Result<()> {
        sqlx_core::query::query(
            "INSERT INTO logs (level, source, message, metadata, created_at)
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(entry.level.as_str())
        .bind(&entry.source)
        .bind(&entry.message)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<LogEntry>> {
        let rows = sqlx_core::query::query(
            "SELECT level, source, message, metadata,
                    to_char(created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at
             FROM logs
             ORDER BY id DESC
             LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| LogEntry {
                level: LogLevel::parse(&row.get::<String, _>(0)),
                source: row.get(1),
                message: row.get(2),
                metadata: row.get::<Option<serde_json::Value>, _>(3),
                created_at: row.get(4),
            })
            .collect())
    }

    async fn prune_logs(&self, older_than_days: u32) -> Result<u64> {
        let result = sqlx_core::query::query(
            "DELETE FROM logs WHERE created_at < NOW() - make_interval(days => $1)",
        )
        .bind(i32::try_from(older_than_days).context("retention exceeds i32 range")?)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
