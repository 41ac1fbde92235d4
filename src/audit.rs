// Audit log — the append-only `logs` table.
//
// Every significant pipeline step (fetch, validation failure, success,
// error) is written here as well as to the process log. Writes are
// best-effort: a failed insert is reported through tracing and swallowed,
// so logging can never fail a request.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::db::models::{LogEntry, LogLevel};
use crate::db::Database;

/// Default retention for `prune`, in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

#[derive(Clone)]
pub struct AuditLog {
    db: Arc<dyn Database>,
}

impl AuditLog {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Write one entry. Returns whether the database insert succeeded.
    pub async fn write(&self, entry: LogEntry) -> bool {
        mirror(&entry);
        match self.db.insert_log(&entry).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    error = %e,
                    source_name = %entry.source,
                    entry_message = %entry.message,
                    "Failed to write audit log entry"
                );
                false
            }
        }
    }

    pub async fn info(&self, source: &str, message: impl Into<String>, metadata: Option<Value>) {
        self.write(build_entry(LogLevel::Info, source, message, metadata))
            .await;
    }

    pub async fn warning(&self, source: &str, message: impl Into<String>, metadata: Option<Value>) {
        self.write(build_entry(LogLevel::Warning, source, message, metadata))
            .await;
    }

    pub async fn error(&self, source: &str, message: impl Into<String>, metadata: Option<Value>) {
        self.write(build_entry(LogLevel::Error, source, message, metadata))
            .await;
    }

    /// Delete entries older than `days`, recording the outcome in the log itself.
    pub async fn prune(&self, days: u32) -> anyhow::Result<u64> {
        match self.db.prune_logs(days).await {
            Ok(deleted) => {
                self.info(
                    "prune_logs",
                    format!("Deleted {deleted} audit entries older than {days} days"),
                    None,
                )
                .await;
                Ok(deleted)
            }
            Err(e) => {
                self.error(
                    "prune_logs",
                    format!("Failed to prune audit log: {e}"),
                    None,
                )
                .await;
                Err(e)
            }
        }
    }
}

fn build_entry(
    level: LogLevel,
    source: &str,
    message: impl Into<String>,
    metadata: Option<Value>,
) -> LogEntry {
    let mut entry = LogEntry::new(level, source, message);
    entry.metadata = metadata;
    entry
}

/// Echo an audit entry onto the process log at the matching level.
fn mirror(entry: &LogEntry) {
    let metadata = entry
        .metadata
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_default();
    match entry.level {
        LogLevel::Debug => debug!(source_name = %entry.source, %metadata, "{}", entry.message),
        LogLevel::Info => info!(source_name = %entry.source, %metadata, "{}", entry.message),
        LogLevel::Warning => warn!(source_name = %entry.source, %metadata, "{}", entry.message),
        LogLevel::Error => error!(source_name = %entry.source, %metadata, "{}", entry.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDatabase;
    use crate::db::testing::BrokenDatabase;

    #[tokio::test]
    async fn test_write_persists_entry() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let audit = AuditLog::new(db.clone());
        audit
            .info(
                "system",
                "Application initialized",
                Some(serde_json::json!({ "port": 3000 })),
            )
            .await;
        let logs = db.recent_logs(1).await.unwrap();
        assert_eq!(logs[0].message, "Application initialized");
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[0].metadata, Some(serde_json::json!({ "port": 3000 })));
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let audit = AuditLog::new(Arc::new(BrokenDatabase));
        let ok = audit
            .write(LogEntry::new(LogLevel::Error, "system", "nobody hears this"))
            .await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_prune_surfaces_db_error() {
        let audit = AuditLog::new(Arc::new(BrokenDatabase));
        assert!(audit.prune(DEFAULT_RETENTION_DAYS).await.is_err());
    }
}
