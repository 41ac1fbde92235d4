// GET /generate/text — one freshly generated sentence.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{pipeline_error_response, AppState};

pub async fn generate_text(State(state): State<AppState>) -> Response {
    match state.services.generate_text().await {
        Ok(generated) => Json(serde_json::json!({ "text": generated.text })).into_response(),
        Err(err) => pipeline_error_response(&err),
    }
}
