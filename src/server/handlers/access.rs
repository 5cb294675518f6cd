use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_admin_key;
use crate::identity::UserAttribute;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModifyAccessRequest {
    pub username: String,
    pub attributes: Vec<UserAttribute>,
}

/// Update a user's access attributes in the identity provider. Admin-only;
/// the caller's own attributes play no role here.
pub async fn modify_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ModifyAccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_key(&headers, state.config.admin_api_key.as_deref())?;

    tracing::info!(
        "Received request to modify user {} with {} attribute(s)",
        request.username,
        request.attributes.len()
    );

    state
        .identity
        .update_user_attributes(&request.username, &request.attributes)
        .await?;

    Ok(Json(json!(format!(
        "User '{}' updated successfully.",
        request.username
    ))))
}

/// List users together with their stored attributes. Admin-only.
pub async fn list_access(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_admin_key(&headers, state.config.admin_api_key.as_deref())?;

    let users = state.identity.list_users().await?;
    tracing::info!("Retrieved {} users from the identity provider", users.len());

    Ok(Json(json!({ "users": users })))
}
