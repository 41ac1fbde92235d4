// Database queries — CRUD operations for all tables.
//
// Every SQLite interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{LogEntry, LogLevel, NewPost, PostQuery};

/// Timestamp format matching SQLite's `datetime('now')`.
const SQLITE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// --- Observed posts ---

/// Record one observed post and return its row ID.
pub fn insert_post(conn: &Connection, post: &NewPost) -> Result<i64> {
    let observed_at = post
        .observed_at
        .map(|t| t.format(SQLITE_TIME_FORMAT).to_string());
    conn.execute(
        "INSERT INTO observations (user_name, instance_name, post_text, observed_at)
         VALUES (?1, ?2, ?3, COALESCE(?4, datetime('now')))",
        params![post.user_name, post.instance_name, post.text, observed_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch post texts that pass the corpus quality predicates.
///
/// Windowed reads are ordered newest-first; unwindowed reads keep table order.
pub fn fetch_post_texts(conn: &Connection, query: &PostQuery) -> Result<Vec<String>> {
    let base = "SELECT post_text FROM observations
                WHERE post_text IS NOT NULL
                  AND length(post_text) >= ?1
                  AND post_text NOT LIKE '%http%'
                  AND post_text NOT LIKE '%@%'";

    let texts = match query.within_hours {
        Some(hours) => {
            let sql = format!(
                "{base} AND observed_at >= datetime('now', ?2)
                 ORDER BY observed_at DESC, id DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params![query.min_length, format!("-{hours} hours"), query.limit],
                |row| row.get::<_, String>(0),
            )?;
            rows.collect::<rusqlite::Result<Vec<String>>>()?
        }
        None => {
            let sql = format!("{base} LIMIT ?2");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![query.min_length, query.limit], |row| {
                row.get::<_, String>(0)
            })?;
            rows.collect::<rusqlite::Result<Vec<String>>>()?
        }
    };

    Ok(texts)
}

/// Count stored posts, optionally restricted to the last `within_hours`.
pub fn count_posts(conn: &Connection, within_hours: Option<u32>) -> Result<i64> {
    let count = match within_hours {
        Some(hours) => conn.query_row(
            "SELECT COUNT(*) FROM observations WHERE observed_at >= datetime('now', ?1)",
            params![format!("-{hours} hours")],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?,
    };
    Ok(count)
}

/// Delete every observed post.
pub fn clear_posts(conn: &Connection) -> Result<u64> {
    let deleted = conn.execute("DELETE FROM observations", [])?;
    Ok(deleted as u64)
}

// --- Configuration rows ---

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM note_text WHERE key = ?1")?;
    let result: Option<Option<String>> =
        stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result.flatten())
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO note_text (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Memorandum rows ---

pub fn get_memo(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM memorandum WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

pub fn set_memo(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO memorandum (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Audit log ---

pub fn insert_log(conn: &Connection, entry: &LogEntry) -> Result<()> {
    let metadata = entry
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO logs (level, source, message, metadata) VALUES (?1, ?2, ?3, ?4)",
        params![entry.level.as_str(), entry.source, entry.message, metadata],
    )?;
    Ok(())
}

pub fn recent_logs(conn: &Connection, limit: u32) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT level, source, message, metadata, created_at
         FROM logs
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        let level: String = row.get(0)?;
        let metadata: Option<String> = row.get(3)?;
        Ok(LogEntry {
            level: LogLevel::parse(&level),
            source: row.get(1)?,
            message: row.get(2)?,
            metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
            created_at: row.get(4)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

pub fn prune_logs(conn: &Connection, older_than_days: u32) -> Result<u64> {
    let deleted = conn.execute(
        "DELETE FROM logs WHERE created_at < datetime('now', ?1)",
        params![format!("-{older_than_days} days")],
    )?;
    Ok(deleted as u64)
}
