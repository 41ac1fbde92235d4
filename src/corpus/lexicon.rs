// Lexical sets — the forbidden and stop word lists.
//
// Both live as single rows in `note_text`, written by an operator and never
// by the pipeline. A row may hold a JSON array or a comma/newline separated
// string. Reads fail open: a missing row, an empty row, or a database
// error all give the empty set, so filtering is skipped rather than the
// request blocked.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;

use crate::audit::AuditLog;
use crate::db::Database;
use crate::error::ErrorKind;

/// A set of words matched by exact string comparison (no case folding).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalSet {
    members: BTreeSet<String>,
}

impl LexicalSet {
    /// Build a set from words. Blank members are dropped, since an empty
    /// string would match every text as a substring.
    ///
    /// Each member is trimmed at both ends and otherwise stored verbatim:
    /// inner whitespace stays, and there is no case or width folding.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = words
            .into_iter()
            .map(Into::into)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { members }
    }

    /// Decode a stored row: a JSON array of strings, or a delimited string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') {
            if let Ok(words) = serde_json::from_str::<Vec<String>>(trimmed) {
                return Self::from_words(words);
            }
        }
        Self::from_words(trimmed.split([',', '\n']))
    }

    /// Read the row stored under `key`, failing open to the empty set.
    pub async fn load(db: &Arc<dyn Database>, audit: &AuditLog, key: &str) -> Self {
        match db.get_setting(key).await {
            Ok(Some(raw)) => Self::parse(&raw),
            Ok(None) => Self::default(),
            Err(e) => {
                audit
                    .error(
                        "text_processor",
                        format!("Error fetching {key} words: {e}"),
                        Some(json!({ "error_type": ErrorKind::UpstreamIo.as_str(), "key": key })),
                    )
                    .await;
                Self::default()
            }
        }
    }

    /// Exact membership.
    pub fn contains(&self, word: &str) -> bool {
        self.members.contains(word)
    }

    /// True iff any member occurs as a substring of `text`.
    pub fn contains_any(&self, text: &str) -> bool {
        self.members.iter().any(|w| text.contains(w.as_str()))
    }

    /// The members found inside `text`, for logging.
    pub fn matches_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.members
            .iter()
            .map(String::as_str)
            .filter(move |w| text.contains(w))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// JSON array encoding used when the CLI writes a list.
    pub fn to_json(&self) -> String {
        serde_json::Value::from(self.members.iter().cloned().collect::<Vec<_>>()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDatabase;
    use crate::db::testing::BrokenDatabase;

    #[test]
    fn test_parse_json_array() {
        let set = LexicalSet::parse(r#"["馬鹿", "阿呆", ""]"#);
        assert_eq!(set.len(), 2);
        assert!(set.contains("馬鹿"));
    }

    #[test]
    fn test_parse_delimited() {
        let set = LexicalSet::parse("今日, 明日\n昨日,,");
        assert_eq!(set.len(), 3);
        assert!(set.contains("明日"));
        assert!(set.contains("昨日"));
    }

    #[test]
    fn test_malformed_json_falls_back_to_delimited() {
        let set = LexicalSet::parse("[猫,犬");
        assert!(set.contains("[猫"));
        assert!(set.contains("犬"));
    }

    #[test]
    fn test_contains_is_exact() {
        let set = LexicalSet::from_words(["Cat"]);
        assert!(set.contains("Cat"));
        assert!(!set.contains("cat"));
        assert!(!set.contains("Cats"));
    }

    #[test]
    fn test_members_trimmed_but_not_normalised() {
        let set = LexicalSet::parse(r#"[" ニュー ヨーク ", "Tokyo", "ＡＢＣ"]"#);
        assert!(set.contains("ニュー ヨーク"));
        assert!(!set.contains("ニューヨーク"));
        assert!(!set.contains(" ニュー ヨーク "));
        assert!(!set.contains("tokyo"));
        assert!(!set.contains("ABC"));
        assert!(set.contains_any("今日はニュー ヨークへ"));
    }

    #[test]
    fn test_contains_any_is_substring() {
        let set = LexicalSet::from_words(["禁止"]);
        assert!(set.contains_any("これは禁止語です"));
        assert!(!set.contains_any("これは普通の文です"));
        assert!(!LexicalSet::default().contains_any("anything"));
    }

    #[test]
    fn test_matches_in_lists_hits() {
        let set = LexicalSet::from_words(["猫", "犬", "鳥"]);
        let hits: Vec<_> = set.matches_in("猫と犬").collect();
        assert_eq!(hits, vec!["犬", "猫"]);
    }

    #[test]
    fn test_to_json_roundtrips_through_parse() {
        let set = LexicalSet::from_words(["a,b", "c"]);
        assert_eq!(LexicalSet::parse(&set.to_json()), set);
    }

    #[tokio::test]
    async fn test_load_missing_row_is_empty() {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
        let audit = AuditLog::new(db.clone());
        assert!(LexicalSet::load(&db, &audit, "forbidden").await.is_empty());

        db.set_setting("forbidden", r#"["禁止"]"#).await.unwrap();
        assert_eq!(LexicalSet::load(&db, &audit, "forbidden").await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_fails_open() {
        let db: Arc<dyn Database> = Arc::new(BrokenDatabase);
        let audit = AuditLog::new(db.clone());
        assert!(LexicalSet::load(&db, &audit, "stop_words").await.is_empty());
    }
}
