use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failures of the retrieval pipeline steps.
///
/// These are caught at the invoke handler and converted into a
/// `{"type": "error"}` answer body; they never escape to the transport
/// layer. The full error text goes to the logs, the caller only sees
/// [`PipelineError::user_message`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured model provider is not in the supported set. No
    /// network call is made when this is raised.
    #[error("model provider {0} is not supported")]
    UnsupportedProvider(String),

    /// The identity provider rejected the token or the lookup failed.
    /// Carries the provider's error code/message pair.
    #[error("identity lookup failed: {code} - {message}")]
    IdentityLookup { code: String, message: String },

    /// The document index was unreachable or returned a malformed
    /// response. The request aborts; partial results are never returned.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The generation backend failed. Never replaced with a fabricated
    /// answer.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl PipelineError {
    pub fn retrieval<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Retrieval(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Generation(err.to_string())
    }

    /// Message that is safe to hand back to the caller. Identity failures
    /// surface the provider's code/message pair; everything else is a
    /// generic description with the detail kept in the logs.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::UnsupportedProvider(_) => {
                "The configured model provider is not supported.".to_string()
            }
            PipelineError::IdentityLookup { code, message } => {
                format!("Access check failed: {} - {}", code, message)
            }
            PipelineError::Retrieval(_) => {
                "The document search backend is currently unavailable.".to_string()
            }
            PipelineError::Generation(_) => {
                "Answer generation failed. Please try again later.".to_string()
            }
        }
    }
}
