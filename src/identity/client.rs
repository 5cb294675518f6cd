use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::config::{AttributeConfig, IdentityConfig};
use crate::core::errors::{ApiError, PipelineError};

use super::attributes::AccessAttributeSet;

/// One name/value claim as the provider stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    username: String,
    #[serde(default)]
    attributes: Vec<UserAttribute>,
}

/// A user as listed by the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub attributes: Vec<UserAttribute>,
}

#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// HTTP client for the identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    endpoint: String,
    admin_token: Option<String>,
    attributes: AttributeConfig,
    client: Client,
}

impl IdentityClient {
    pub fn new(
        config: &IdentityConfig,
        attributes: AttributeConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            admin_token: config.admin_token.clone(),
            attributes,
            client,
        })
    }

    /// Describe the calling user and reduce the provider's claims to the
    /// configured access attributes. Always a fresh lookup.
    pub async fn resolve_attributes(
        &self,
        access_token: &str,
    ) -> Result<AccessAttributeSet, PipelineError> {
        let profile = self.get_user(access_token).await?;
        let set =
            AccessAttributeSet::from_provider_attributes(&profile.attributes, &self.attributes);

        tracing::info!("A new query has been submitted by {}", profile.username);
        Ok(set)
    }

    async fn get_user(&self, access_token: &str) -> Result<UserProfile, PipelineError> {
        let url = format!("{}/user", self.endpoint);

        let res = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PipelineError::IdentityLookup {
                code: "ProviderUnreachable".to_string(),
                message: e.to_string(),
            })?;

        if !res.status().is_success() {
            return Err(identity_error(res).await);
        }

        res.json().await.map_err(|e| PipelineError::IdentityLookup {
            code: "MalformedResponse".to_string(),
            message: e.to_string(),
        })
    }

    /// Admin operation: replace the named user's attribute values. Guarded
    /// by the service's admin key, not by the caller's own attributes.
    pub async fn update_user_attributes(
        &self,
        username: &str,
        attributes: &[UserAttribute],
    ) -> Result<(), ApiError> {
        let url = format!("{}/admin/users/{}/attributes", self.endpoint, username);
        let body = json!({ "attributes": attributes });

        let mut req = self.client.post(&url).json(&body);
        if let Some(token) = &self.admin_token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.map_err(ApiError::internal)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "identity provider error {}: {}",
                status, text
            )));
        }

        Ok(())
    }

    /// Admin operation: list users with their stored attributes.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let url = format!("{}/admin/users", self.endpoint);

        let mut req = self.client.get(&url);
        if let Some(token) = &self.admin_token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await.map_err(ApiError::internal)?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "identity provider error {}: {}",
                status, text
            )));
        }

        let payload: UserListResponse = res.json().await.map_err(ApiError::internal)?;
        Ok(payload.users)
    }
}

/// Map a non-2xx provider response to the code/message pair the caller is
/// allowed to see.
async fn identity_error(res: Response) -> PipelineError {
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);

    let code = body
        .get("code")
        .and_then(|c| c.as_str())
        .unwrap_or("IdentityError")
        .to_string();
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(|| status.to_string());

    PipelineError::IdentityLookup { code, message }
}
