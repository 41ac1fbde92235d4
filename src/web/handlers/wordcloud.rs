// GET /generate/wordcloud — a PNG word cloud of the last four hours.
//
// The image is rendered into a NamedTempFile that lives for the duration of
// the handler; dropping it deletes the file on every return path.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::error::{ErrorKind, PipelineError};
use crate::web::{api_error, pipeline_error_response, AppState, GENERIC_ERROR};
use crate::wordcloud::CloudOutcome;

const SOURCE: &str = "wordcloud";

pub async fn generate_wordcloud(State(state): State<AppState>) -> Response {
    let audit = &state.services.audit;

    let file = match tempfile::Builder::new()
        .prefix("wordcloud-")
        .suffix(".png")
        .tempfile()
    {
        Ok(file) => file,
        Err(e) => {
            audit
                .error(
                    SOURCE,
                    format!("Failed to create temporary file: {e}"),
                    Some(json!({ "error_type": ErrorKind::Unexpected.as_str() })),
                )
                .await;
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR);
        }
    };

    match state.services.render_wordcloud(file.path()).await {
        Ok(CloudOutcome::Rendered(_)) => png_response(&state, &file).await,
        Ok(CloudOutcome::NoEligibleWords) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate word cloud",
        ),
        Err(err) => pipeline_error_response(&err),
    }
}

async fn png_response(state: &AppState, file: &NamedTempFile) -> Response {
    match tokio::fs::read(file.path()).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"wordcloud.png\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            let err = PipelineError::UpstreamIo(format!("rendered image unreadable: {e}"));
            state
                .services
                .audit
                .error(
                    SOURCE,
                    err.to_string(),
                    Some(json!({ "error_type": err.kind().as_str() })),
                )
                .await;
            pipeline_error_response(&err)
        }
    }
}
