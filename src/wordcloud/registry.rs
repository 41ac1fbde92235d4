// Word-cloud registry — words already shown in earlier clouds.
//
// An insertion-ordered, duplicate-free list capped at 400 entries. Merging
// appends unseen words at the back and evicts from the front, so the oldest
// words are forgotten first. Reads never reorder entries (FIFO, not LRU).
//
// The list is stored as one `memorandum` row. The encoding is versioned:
// `v1:` followed by a JSON array. Rows written by older deployments as a
// bare comma-separated string are still read.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::audit::AuditLog;
use crate::corpus::LexicalSet;
use crate::db::models::WORDCLOUD_REGISTRY_KEY;
use crate::db::Database;
use crate::error::ErrorKind;

/// Maximum number of words the registry retains.
pub const REGISTRY_CAPACITY: usize = 400;

const V1_PREFIX: &str = "v1:";
const SOURCE: &str = "wordcloud_registry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    words: Vec<String>,
    capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_capacity(REGISTRY_CAPACITY)
    }
}

impl Registry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::new(),
            capacity,
        }
    }

    /// Build a registry by merging `words` into an empty one.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        registry.merge(words);
        registry
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    /// Union `new_words` into the registry, then cap it.
    ///
    /// Existing words keep their position; unseen words are appended in the
    /// order given. Words are trimmed at both ends and otherwise compared
    /// verbatim (inner whitespace kept, no case folding); blank words are
    /// ignored. Returns how many words were appended (before eviction).
    pub fn merge<I, S>(&mut self, new_words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.words.iter().cloned().collect();
        let mut added = 0;
        for word in new_words {
            let word = word.as_ref().trim();
            if word.is_empty() || !seen.insert(word.to_string()) {
                continue;
            }
            self.words.push(word.to_string());
            added += 1;
        }

        if self.words.len() > self.capacity {
            let excess = self.words.len() - self.capacity;
            self.words.drain(..excess);
        }
        added
    }

    /// The registry as an exclusion set for noun filtering.
    pub fn to_lexical_set(&self) -> LexicalSet {
        LexicalSet::from_words(self.words.iter().map(String::as_str))
    }

    pub fn encode(&self) -> String {
        format!("{V1_PREFIX}{}", json!(self.words))
    }

    /// Decode a stored row (versioned or legacy comma-separated).
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.strip_prefix(V1_PREFIX) {
            Some(payload) => {
                let words: Vec<String> = serde_json::from_str(payload)
                    .context("Malformed v1 word-cloud registry payload")?;
                Ok(Self::from_words(words))
            }
            None => Ok(Self::from_words(raw.split(','))),
        }
    }
}

/// Loads and updates the persisted registry.
///
/// All updates in this process go through one mutex held across
/// load, merge and upsert, so concurrent renders cannot lose each other's
/// words. Separate processes sharing a database can still race.
#[derive(Clone)]
pub struct RegistryManager {
    db: Arc<dyn Database>,
    audit: AuditLog,
    lock: Arc<Mutex<()>>,
}

impl RegistryManager {
    pub fn new(db: Arc<dyn Database>, audit: AuditLog) -> Self {
        Self {
            db,
            audit,
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read(&self) -> Result<Registry> {
        match self.db.get_memo(WORDCLOUD_REGISTRY_KEY).await? {
            Some(raw) => Registry::decode(&raw),
            None => Ok(Registry::default()),
        }
    }

    /// Current registry; an unreadable row yields an empty registry.
    pub async fn load(&self) -> Registry {
        match self.read().await {
            Ok(registry) => registry,
            Err(e) => {
                self.audit
                    .error(
                        SOURCE,
                        format!("Error fetching wordcloud registry: {e:#}"),
                        Some(json!({ "error_type": ErrorKind::UpstreamIo.as_str() })),
                    )
                    .await;
                Registry::default()
            }
        }
    }

    /// Merge `new_words` into the stored registry. Returns whether the
    /// write succeeded.
    ///
    /// When the stored row cannot be read, nothing is written: overwriting
    /// it with only the new words would silently forget the old ones.
    pub async fn merge(&self, new_words: &[String]) -> bool {
        let _guard = self.lock.lock().await;

        let mut registry = match self.read().await {
            Ok(registry) => registry,
            Err(e) => {
                self.audit
                    .error(
                        SOURCE,
                        format!("Error reading wordcloud registry before update: {e:#}"),
                        Some(json!({ "error_type": ErrorKind::UpstreamIo.as_str() })),
                    )
                    .await;
                return false;
            }
        };

        let added = registry.merge(new_words);
        debug!(added, "Merged word-cloud registry");

        match self
            .db
            .set_memo(WORDCLOUD_REGISTRY_KEY, &registry.encode())
            .await
        {
            Ok(()) => {
                debug!(
                    total = registry.len(),
                    capacity = registry.capacity(),
                    "Stored word-cloud registry"
                );
                true
            }
            Err(e) => {
                self.audit
                    .error(
                        SOURCE,
                        format!("Error updating wordcloud registry: {e}"),
                        Some(json!({ "error_type": ErrorKind::UpstreamIo.as_str() })),
                    )
                    .await;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDatabase;
    use crate::db::testing::BrokenDatabase;

    fn numbered(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("語{i}")).collect()
    }

    #[test]
    fn test_merge_appends_unseen_in_order() {
        let mut r = Registry::from_words(["猫", "犬"]);
        let added = r.merge(["鳥", "猫", "魚", "鳥"]);
        assert_eq!(added, 2);
        assert_eq!(r.words(), ["猫", "犬", "鳥", "魚"]);
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let mut r = Registry::from_words(numbered(0..50));
        let before = r.clone();
        r.merge(before.words().to_vec());
        assert_eq!(r, before);
    }

    #[test]
    fn test_merge_evicts_oldest_beyond_capacity() {
        let mut r = Registry::from_words(numbered(0..399));
        r.merge(numbered(1000..1005));
        assert_eq!(r.len(), 400);
        assert_eq!(r.words()[0], "語4");
        assert!(!r.contains("語3"));
        for w in numbered(1000..1005) {
            assert!(r.contains(&w));
        }
    }

    #[test]
    fn test_capacity_holds_for_large_batches() {
        let mut r = Registry::from_words(numbered(0..300));
        r.merge(numbered(300..1300));
        assert_eq!(r.len(), REGISTRY_CAPACITY);
        assert_eq!(r.words().last().map(String::as_str), Some("語1299"));
    }

    #[test]
    fn test_blank_words_are_ignored() {
        let r = Registry::from_words(["", "  ", "猫"]);
        assert_eq!(r.words(), ["猫"]);
    }

    #[test]
    fn test_merge_trims_ends_only() {
        let mut r = Registry::from_words([" 東京 タワー "]);
        assert_eq!(r.merge(["東京 タワー", "東京タワー", "Tokyo", "tokyo"]), 3);
        assert_eq!(r.words(), &["東京 タワー", "東京タワー", "Tokyo", "tokyo"]);
    }

    #[test]
    fn test_encode_decode_preserves_delimiters() {
        let r = Registry::from_words(["a,b", "c\"d", "東京"]);
        assert!(r.encode().starts_with("v1:"));
        assert_eq!(Registry::decode(&r.encode()).unwrap(), r);
    }

    #[test]
    fn test_decode_legacy_comma_rows() {
        let r = Registry::decode("猫, 犬,,猫 ,鳥").unwrap();
        assert_eq!(r.words(), ["猫", "犬", "鳥"]);
    }

    #[test]
    fn test_decode_rejects_corrupt_v1() {
        assert!(Registry::decode("v1:[\"unterminated").is_err());
    }

    #[tokio::test]
    async fn test_manager_merge_persists() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let manager = RegistryManager::new(db.clone(), AuditLog::new(db.clone()));

        assert!(manager.load().await.is_empty());
        assert!(manager.merge(&["猫".to_string(), "犬".to_string()]).await);
        assert!(manager.merge(&["犬".to_string(), "鳥".to_string()]).await);
        assert_eq!(manager.load().await.words(), ["猫", "犬", "鳥"]);
    }

    #[tokio::test]
    async fn test_manager_reads_legacy_row() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        db.set_memo(WORDCLOUD_REGISTRY_KEY, "猫,犬").await.unwrap();
        let manager = RegistryManager::new(db.clone(), AuditLog::new(db.clone()));
        assert!(manager.merge(&["鳥".to_string()]).await);

        let stored = db.get_memo(WORDCLOUD_REGISTRY_KEY).await.unwrap().unwrap();
        assert!(stored.starts_with("v1:"));
        assert_eq!(manager.load().await.words(), ["猫", "犬", "鳥"]);
    }

    #[tokio::test]
    async fn test_manager_concurrent_merges_keep_all_words() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let manager = RegistryManager::new(db.clone(), AuditLog::new(db.clone()));

        let mut handles = Vec::new();
        for batch in 0..8 {
            let m = manager.clone();
            handles.push(tokio::spawn(async move {
                m.merge(&numbered(batch * 10..batch * 10 + 10)).await
            }));
        }
        for h in handles {
            assert!(h.await.unwrap());
        }
        assert_eq!(manager.load().await.len(), 80);
    }

    #[tokio::test]
    async fn test_manager_fails_without_database() {
        let db: Arc<dyn Database> = Arc::new(BrokenDatabase);
        let manager = RegistryManager::new(db.clone(), AuditLog::new(db));
        assert!(manager.load().await.is_empty());
        assert!(!manager.merge(&["猫".to_string()]).await);
    }
}
