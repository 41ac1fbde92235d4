// Corpus loader — quality-filtered post reads for one request.
//
// The predicates themselves (non-null, minimum length, no URL or mention
// markers) live in the SQL of each backend. This layer only picks the
// window and turns a data-store failure into an empty corpus.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::audit::AuditLog;
use crate::db::models::PostQuery;
use crate::db::Database;
use crate::error::ErrorKind;

/// Size of the recent-posts window used for word clouds.
pub const WINDOW_HOURS: u32 = 4;

const SOURCE: &str = "data_fetcher";

#[derive(Clone)]
pub struct CorpusLoader {
    db: Arc<dyn Database>,
    audit: AuditLog,
}

impl CorpusLoader {
    pub fn new(db: Arc<dyn Database>, audit: AuditLog) -> Self {
        Self { db, audit }
    }

    /// Fetch up to 1000 eligible posts, optionally only the last 4 hours.
    ///
    /// Never fails: a data-store error is audit-logged and yields an empty
    /// corpus.
    pub async fn fetch(&self, windowed: bool) -> Vec<String> {
        let query = PostQuery {
            within_hours: windowed.then_some(WINDOW_HOURS),
            ..PostQuery::default()
        };

        match self.db.fetch_post_texts(&query).await {
            Ok(posts) => {
                debug!(count = posts.len(), windowed, "Fetched corpus");
                self.audit
                    .info(
                        SOURCE,
                        "Successfully fetched texts from database",
                        Some(json!({ "count": posts.len(), "windowed": windowed })),
                    )
                    .await;
                posts
            }
            Err(e) => {
                self.audit
                    .error(
                        SOURCE,
                        format!("Database error: {e}"),
                        Some(json!({
                            "error_type": ErrorKind::UpstreamIo.as_str(),
                            "windowed": windowed,
                        })),
                    )
                    .await;
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{LogLevel, NewPost};
    use crate::db::sqlite::SqliteDatabase;
    use crate::db::testing::BrokenDatabase;

    fn post(text: &str) -> NewPost {
        NewPost {
            text: text.to_string(),
            ..NewPost::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_applies_quality_predicates() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        db.insert_post(&post("今日はとても良い天気でした")).await.unwrap();
        db.insert_post(&post("短い")).await.unwrap();
        db.insert_post(&post("見てね https://example.com/page")).await.unwrap();
        db.insert_post(&post("@someone こんにちは、元気ですか")).await.unwrap();

        let loader = CorpusLoader::new(db.clone(), AuditLog::new(db));
        let posts = loader.fetch(false).await;
        assert_eq!(posts, vec!["今日はとても良い天気でした".to_string()]);
    }

    #[tokio::test]
    async fn test_windowed_fetch_skips_old_posts() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let old = chrono::Utc::now() - chrono::Duration::hours(6);
        db.insert_post(&NewPost {
            observed_at: Some(old),
            ..post("六時間前の投稿です、もう古いですね")
        })
        .await
        .unwrap();
        db.insert_post(&post("さっきの投稿です、まだ新しいですね"))
            .await
            .unwrap();

        let loader = CorpusLoader::new(db.clone(), AuditLog::new(db));
        assert_eq!(loader.fetch(true).await.len(), 1);
        assert_eq!(loader.fetch(false).await.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_corpus() {
        let db: Arc<dyn Database> = Arc::new(BrokenDatabase);
        let loader = CorpusLoader::new(db.clone(), AuditLog::new(db));
        assert!(loader.fetch(true).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_audited() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let loader = CorpusLoader::new(db.clone(), AuditLog::new(db.clone()));
        loader.fetch(false).await;
        let logs = db.recent_logs(1).await.unwrap();
        assert_eq!(logs[0].source, "data_fetcher");
        assert_eq!(logs[0].level, LogLevel::Info);
    }
}
