// Test doubles for the Database trait.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{LogEntry, NewPost, PostQuery};
use super::traits::Database;

/// A database whose every call fails.
pub struct BrokenDatabase;

#[async_trait]
impl Database for BrokenDatabase {
    async fn table_count(&self) -> Result<i64> {
        anyhow::bail!("database offline")
    }
    async fn insert_post(&self, _post: &NewPost) -> Result<i64> {
        anyhow::bail!("database offline")
    }
    async fn fetch_post_texts(&self, _query: &PostQuery) -> Result<Vec<String>> {
        anyhow::bail!("database offline")
    }
    async fn count_posts(&self, _within_hours: Option<u32>) -> Result<i64> {
        anyhow::bail!("database offline")
    }
    async fn clear_posts(&self) -> Result<u64> {
        anyhow::bail!("database offline")
    }
    async fn get_setting(&self, _key: &str) -> Result<Option<String>> {
        anyhow::bail!("database offline")
    }
    async fn set_setting(&self, _key: &str, _value: &str) -> Result<()> {
        anyhow::bail!("database offline")
    }
    async fn get_memo(&self, _key: &str) -> Result<Option<String>> {
        anyhow::bail!("database offline")
    }
    async fn set_memo(&self, _key: &str, _value: &str) -> Result<()> {
        anyhow::bail!("database offline")
    }
    async fn insert_log(&self, _entry: &LogEntry) -> Result<()> {
        anyhow::bail!("database offline")
    }
    async fn recent_logs(&self, _limit: u32) -> Result<Vec<LogEntry>> {
        anyhow::bail!("database offline")
    }
    async fn prune_logs(&self, _older_than_days: u32) -> Result<u64> {
        anyhow::bail!("database offline")
    }
}
