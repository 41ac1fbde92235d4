// System status display — corpus size, word lists, registry fill, recent log.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::corpus::loader::WINDOW_HOURS;
use crate::corpus::LexicalSet;
use crate::db::models::{LogLevel, FORBIDDEN_KEY, STOP_WORDS_KEY, WORDCLOUD_REGISTRY_KEY};
use crate::db::Database;
use crate::wordcloud::Registry;

/// Audit entries shown at the bottom of the report.
const RECENT_LOG_ENTRIES: u32 = 5;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, config: &Config) -> Result<()> {
    if config.uses_postgres() {
        println!("Database: {}", config.db_display());
    } else {
        let file_size = std::fs::metadata(Path::new(&config.db_path))
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "unknown".to_string());
        println!("Database: {} ({})", config.db_path, file_size);
    }

    let total = db.count_posts(None).await?;
    let recent = db.count_posts(Some(WINDOW_HOURS)).await?;
    println!("Posts: {total} total, {recent} in the last {WINDOW_HOURS} hours");
    if total == 0 {
        println!("  Run `murmur ingest <file>` to load posts");
    }

    for (label, key) in [("Forbidden words", FORBIDDEN_KEY), ("Stop words", STOP_WORDS_KEY)] {
        let count = db
            .get_setting(key)
            .await?
            .map(|raw| LexicalSet::parse(&raw).len())
            .unwrap_or(0);
        println!("{label}: {count}");
    }

    let registry = match db.get_memo(WORDCLOUD_REGISTRY_KEY).await? {
        Some(raw) => Registry::decode(&raw)?,
        None => Registry::default(),
    };
    println!(
        "Word-cloud registry: {}/{} words",
        registry.len(),
        registry.capacity()
    );

    let logs = db.recent_logs(RECENT_LOG_ENTRIES).await?;
    if logs.is_empty() {
        println!("Recent log: empty");
    } else {
        println!("Recent log ({} most recent):", logs.len());
        for entry in &logs {
            let level = match entry.level {
                LogLevel::Error => entry.level.as_str().red(),
                LogLevel::Warning => entry.level.as_str().yellow(),
                _ => entry.level.as_str().normal(),
            };
            println!(
                "  {} {} [{}] {}",
                entry.created_at.as_deref().unwrap_or("-").dimmed(),
                level,
                entry.source,
                entry.message
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
