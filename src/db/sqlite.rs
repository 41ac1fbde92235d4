// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection sits behind a tokio::sync::Mutex. Each trait method locks
// it, runs its statements synchronously and returns; no statement spans an
// .await.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{LogEntry, NewPost, PostQuery};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_post(&conn, post)
    }

    async fn fetch_post_texts(&self, query: &PostQuery) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::fetch_post_texts(&conn, query)
    }

    async fn count_posts(&self, within_hours: Option<u32>) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_posts(&conn, within_hours)
    }

    async fn clear_posts(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        super::queries::clear_posts(&conn)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_setting(&conn, key)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_setting(&conn, key, value)
    }

    async fn get_memo(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_memo(&conn, key)
    }

    async fn set_memo(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_memo(&conn, key, value)
    }

    async fn insert_log(&self, entry: &LogEntry) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_log(&conn, entry)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().await;
        super::queries::recent_logs(&conn, limit)
    }

    async fn prune_logs(&self, older_than_days: u32) -> Result<u64> {
        let conn = self.conn.lock().await;
        super::queries::prune_logs(&conn, older_than_days)
    }
}
