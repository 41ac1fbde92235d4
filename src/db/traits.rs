// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementors: SqliteDatabase (wraps rusqlite), PgDatabase (wraps sqlx).
// All methods are async so both sync (rusqlite via Mutex) and native async
// (sqlx) backends fit behind a single interface.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{LogEntry, NewPost, PostQuery};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Observed posts ---

    /// Record one observed post and return its ID.
    async fn insert_post(&self, post: &NewPost) -> Result<i64>;

    /// Fetch post texts matching the corpus quality predicates.
    async fn fetch_post_texts(&self, query: &PostQuery) -> Result<Vec<String>>;

    /// Count stored posts, optionally only those from the last `within_hours`.
    async fn count_posts(&self, within_hours: Option<u32>) -> Result<i64>;

    /// Remove every observed post. Returns the number of rows deleted.
    async fn clear_posts(&self) -> Result<u64>;

    // --- Configuration rows (note_text) ---

    /// Read a configuration value by key (e.g. "forbidden").
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Set a configuration value (upsert).
    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    // --- System-maintained rows (memorandum) ---

    /// Read a memorandum value by key (e.g. "wordcloud_forbidden").
    async fn get_memo(&self, key: &str) -> Result<Option<String>>;

    /// Set a memorandum value (upsert).
    async fn set_memo(&self, key: &str, value: &str) -> Result<()>;

    // --- Audit log ---

    /// Append one audit log entry.
    async fn insert_log(&self, entry: &LogEntry) -> Result<()>;

    /// Most recent audit entries, newest first.
    async fn recent_logs(&self, limit: u32) -> Result<Vec<LogEntry>>;

    /// Delete audit entries older than `older_than_days`. Returns rows deleted.
    async fn prune_logs(&self, older_than_days: u32) -> Result<u64>;
}
