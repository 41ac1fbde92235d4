// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// Key of the forbidden-word row in `note_text`.
pub const FORBIDDEN_KEY: &str = "forbidden";
/// Key of the stop-word row in `note_text`.
pub const STOP_WORDS_KEY: &str = "stop_words";
/// Key of the word-cloud registry row in `memorandum`.
pub const WORDCLOUD_REGISTRY_KEY: &str = "wordcloud_forbidden";

/// A post observed on the timeline, ready to be inserted.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub user_name: Option<String>,
    pub instance_name: Option<String>,
    pub text: String,
    /// Observation time; `None` means "now" on the database clock.
    pub observed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Filter for corpus reads.
///
/// Posts must be non-null, at least `min_length` characters, and free of
/// URL (`http`) and mention (`@`) markers. Those predicates are fixed in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub min_length: u32,
    /// Restrict to posts observed within this many hours, newest first.
    pub within_hours: Option<u32>,
    pub limit: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            min_length: 10,
            within_hours: None,
            limit: 1000,
        }
    }
}

/// Severity of an audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    /// Parse a stored level. Unknown values read back as Info.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "WARNING" | "WARN" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Component that wrote the entry (e.g. "text_generator").
    pub source: String,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    /// Filled in by the database on insert; populated on reads.
    pub created_at: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.to_string(),
            message: message.into(),
            metadata: None,
            created_at: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
