// HTTP surface tests — requests driven through the router without a socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use murmur::db::models::NewPost;
use murmur::db::sqlite::SqliteDatabase;
use murmur::db::Database;
use murmur::generation::MarkovFactory;
use murmur::pipeline::{Collaborators, Services};
use murmur::tokenize::ScriptTokenizer;
use murmur::web::{build_router, AppState, GENERIC_ERROR};
use murmur::wordcloud::{CloudOptions, CloudRenderer, FontLocator, RenderedWord};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

struct StubRenderer;

impl CloudRenderer for StubRenderer {
    fn render(
        &self,
        text: &str,
        _font_path: &Path,
        output: &Path,
        _options: &CloudOptions,
    ) -> anyhow::Result<Vec<RenderedWord>> {
        std::fs::write(output, PNG_MAGIC)?;
        Ok(text
            .split_whitespace()
            .take(1)
            .map(|word| RenderedWord {
                word: word.to_string(),
                weight: 1.0,
            })
            .collect())
    }
}

/// Reports success but leaves no file behind.
struct VanishingRenderer;

impl CloudRenderer for VanishingRenderer {
    fn render(
        &self,
        _text: &str,
        _font_path: &Path,
        output: &Path,
        _options: &CloudOptions,
    ) -> anyhow::Result<Vec<RenderedWord>> {
        std::fs::remove_file(output)?;
        Ok(Vec::new())
    }
}

struct Harness {
    db: Arc<dyn Database>,
    router: Router,
    _font_dir: tempfile::TempDir,
}

fn harness(with_font: bool) -> Harness {
    harness_with(with_font, Arc::new(StubRenderer))
}

fn harness_with(with_font: bool, renderer: Arc<dyn CloudRenderer>) -> Harness {
    let font_dir = tempfile::tempdir().unwrap();
    let font: PathBuf = font_dir.path().join("NotoSansCJK-Regular.ttc");
    if with_font {
        std::fs::write(&font, b"stub").unwrap();
    }

    let db: Arc<dyn Database> = Arc::new(SqliteDatabase::in_memory().unwrap());
    let collaborators = Collaborators {
        tokenizer: Arc::new(ScriptTokenizer::new()),
        model_factory: Arc::new(MarkovFactory::new(Some(3))),
        renderer,
        fonts: FontLocator::with_paths(Some(font), Vec::new(), Vec::new()),
    };
    let services = Arc::new(Services::new(db.clone(), collaborators));

    Harness {
        db,
        router: build_router(AppState { services }),
        _font_dir: font_dir,
    }
}

async fn ingest(db: &Arc<dyn Database>, posts: &[&str]) {
    for text in posts {
        db.insert_post(&NewPost {
            user_name: None,
            instance_name: None,
            text: text.to_string(),
            observed_at: None,
        })
        .await
        .unwrap();
    }
}

async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec(), content_type)
}

fn error_message(body: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap();
    value["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness(true);
    let (status, body, _) = get(h.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn text_with_empty_corpus_is_not_found() {
    let h = harness(true);
    let (status, body, _) = get(h.router, "/generate/text").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "No posts found in the database");
}

#[tokio::test]
async fn text_with_small_corpus_is_bad_request() {
    let h = harness(true);
    ingest(
        &h.db,
        &["今日は東京で寿司を食べました", "今日は大阪で寿司を食べました"],
    )
    .await;

    let (status, body, _) = get(h.router, "/generate/text").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&body).contains("insufficient"));
}

#[tokio::test]
async fn text_returns_generated_sentence() {
    let h = harness(true);
    let posts: Vec<String> = ["東京", "大阪", "京都", "札幌", "福岡", "仙台", "横浜", "神戸", "奈良", "金沢"]
        .iter()
        .map(|place| format!("今日は{place}で寿司を食べました"))
        .collect();
    let refs: Vec<&str> = posts.iter().map(String::as_str).collect();
    ingest(&h.db, &refs).await;

    let (status, body, content_type) = get(h.router, "/generate/text").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/json"));
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let text = value["text"].as_str().unwrap();
    assert!(text.starts_with("今日は"));
    assert!(text.ends_with('。'));
}

#[tokio::test]
async fn wordcloud_returns_png_attachment() {
    let h = harness(true);
    ingest(&h.db, &["東京駅で新幹線を待っている"]).await;

    let response = h
        .router
        .oneshot(
            Request::builder()
                .uri("/generate/wordcloud")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"wordcloud.png\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], PNG_MAGIC);
}

#[tokio::test]
async fn wordcloud_with_empty_window_is_not_found() {
    let h = harness(true);
    let (status, _, _) = get(h.router, "/generate/wordcloud").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wordcloud_without_nouns_is_server_error() {
    let h = harness(true);
    ingest(&h.db, &["きょうはとてもねむいです"]).await;

    let (status, body, _) = get(h.router, "/generate/wordcloud").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), "Failed to generate word cloud");
}

#[tokio::test]
async fn wordcloud_without_font_hides_details() {
    let h = harness(false);
    ingest(&h.db, &["東京駅で新幹線を待っている"]).await;

    let (status, body, _) = get(h.router, "/generate/wordcloud").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), GENERIC_ERROR);
}

#[tokio::test]
async fn wordcloud_with_unreadable_output_is_upstream_failure() {
    let h = harness_with(true, Arc::new(VanishingRenderer));
    ingest(&h.db, &["東京駅で新幹線を待っている"]).await;

    let (status, body, _) = get(h.router.clone(), "/generate/wordcloud").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&body), GENERIC_ERROR);

    let logs = h.db.recent_logs(20).await.unwrap();
    assert!(logs.iter().any(|l| l.source == "wordcloud"
        && l.metadata.as_ref().is_some_and(|m| m["error_type"] == "upstream-io-failure")));
}
