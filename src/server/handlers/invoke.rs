use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer;
use crate::core::errors::{ApiError, PipelineError};
use crate::core::security::require_access_token;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    #[serde(alias = "query")]
    pub prompt: Option<String>,
}

/// The answer envelope every handled request ends in, success or failure.
#[derive(Debug, Serialize)]
pub struct AnswerResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl AnswerResult {
    fn ai(content: String) -> Self {
        Self {
            kind: "ai".to_string(),
            content,
        }
    }

    fn error(content: String) -> Self {
        Self {
            kind: "error".to_string(),
            content,
        }
    }
}

/// Explicit preflight responder. Answers immediately with the CORS method
/// and header lists; no identity, index, or model call is made. The
/// allow-origin header comes from the router's CORS layer, which covers
/// every response exactly once.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            ("Access-Control-Allow-Methods", "POST, OPTIONS"),
            (
                "Access-Control-Allow-Headers",
                "Content-Type, Authorization, x-access-token",
            ),
        ],
        "",
    )
}

/// The search endpoint.
///
/// Token and prompt are validated before anything leaves the process;
/// missing input short-circuits with a client-error status. After that,
/// every pipeline failure is converted into a `{"type": "error"}` answer
/// body so the caller always gets the envelope back.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<InvokeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = require_access_token(&headers)?;

    let prompt = body
        .and_then(|Json(request)| request.prompt)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("request body must contain a non-empty prompt".to_string())
        })?;

    let request_id = Uuid::new_v4();
    let result = run_pipeline(&state, &token, &prompt).await;

    let answer = match result {
        Ok(content) => AnswerResult::ai(content),
        Err(err) => {
            tracing::error!(%request_id, "invoke pipeline failed: {}", err);
            AnswerResult::error(err.user_message())
        }
    };

    Ok((StatusCode::OK, Json(answer)))
}

/// Resolve attributes, retrieve, generate. Strictly sequential; each step
/// depends on the previous one's output.
async fn run_pipeline(
    state: &AppState,
    token: &str,
    prompt: &str,
) -> Result<String, PipelineError> {
    let attributes = state.identity.resolve_attributes(token).await?;
    let hits = state.retriever.search(prompt, &attributes).await?;
    let provider = state.llm.generation_provider()?;
    answer::generate_answer(provider.as_ref(), prompt, &hits).await
}
