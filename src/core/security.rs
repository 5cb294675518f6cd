use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::core::errors::ApiError;

const ACCESS_TOKEN_HEADER: &str = "x-access-token";
const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Extract the caller's access token. Missing or empty means the request
/// is rejected before any downstream call is made.
pub fn require_access_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(token.to_string())
}

/// Guard for the admin endpoints. `expected` being `None` means no admin
/// key is configured and the endpoints are disabled outright. Comparison
/// is constant-time.
pub fn require_admin_key(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Err(ApiError::Forbidden);
    };

    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
