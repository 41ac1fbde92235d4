// Web server — Axum routes for on-demand text and word-cloud generation.
//
// Routes take no parameters: each request runs the whole pipeline against
// the current corpus. Pipeline failures map onto status codes by kind;
// unexpected failures return a generic message and the details go to the
// audit log only.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::Services;

pub mod handlers;

/// Body of every 500 that must not leak internals.
pub const GENERIC_ERROR: &str = "Internal server error";

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: &Config, services: Arc<Services>) -> Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    services
        .audit
        .info(
            "system",
            "Application initialized",
            Some(json!({ "host": config.bind, "port": config.port })),
        )
        .await;
    info!("Murmur listening on http://{addr}");

    let app = build_router(AppState { services });
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generate/text", get(handlers::text::generate_text))
        .route(
            "/generate/wordcloud",
            get(handlers::wordcloud::generate_wordcloud),
        )
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(json!({ "status": "ok" })))
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

/// Map a pipeline failure onto its HTTP response.
pub fn pipeline_error_response(err: &PipelineError) -> Response {
    match err.kind() {
        ErrorKind::NoCorpus => api_error(StatusCode::NOT_FOUND, "No posts found in the database"),
        ErrorKind::InsufficientData => api_error(StatusCode::BAD_REQUEST, &err.to_string()),
        ErrorKind::GenerationExhausted => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate a suitable sentence",
        ),
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR),
    }
}
