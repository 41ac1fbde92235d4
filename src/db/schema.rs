// Database schema — table creation.
//
// A `schema_version` table tracks which schema revision has been applied so
// later revisions can migrate forward.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent; runs on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Posts observed on the timeline; the raw corpus
        CREATE TABLE IF NOT EXISTS observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name TEXT,
            instance_name TEXT,
            post_text TEXT,
            observed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Operator-maintained configuration rows (forbidden, stop_words)
        CREATE TABLE IF NOT EXISTS note_text (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- System-maintained rows (wordcloud_forbidden registry)
        CREATE TABLE IF NOT EXISTS memorandum (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Append-only audit log
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            level TEXT NOT NULL,
            source TEXT NOT NULL,
            message TEXT NOT NULL,
            metadata TEXT,                     -- JSON object
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Windowed corpus reads order by observation time
        CREATE INDEX IF NOT EXISTS idx_observations_time
            ON observations(observed_at);

        -- Log pruning deletes by age
        CREATE INDEX IF NOT EXISTS idx_logs_created
            ON logs(created_at);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
