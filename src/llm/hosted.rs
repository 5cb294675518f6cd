use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationProvider;
use crate::core::config::ModelsConfig;
use crate::core::errors::PipelineError;

/// Generation through the hosted foundation-model runtime.
///
/// Temperature is pinned to 0 so the same inputs reproduce the same answer
/// for a given model version.
#[derive(Clone, Debug)]
pub struct HostedProvider {
    endpoint: String,
    model_id: String,
    max_tokens: u32,
    client: Client,
}

impl HostedProvider {
    pub fn new(config: &ModelsConfig, client: Client) -> Self {
        Self {
            endpoint: config.runtime_endpoint.trim_end_matches('/').to_string(),
            model_id: config.generation_model_id.clone(),
            max_tokens: config.max_tokens,
            client,
        }
    }
}

#[async_trait]
impl GenerationProvider for HostedProvider {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = format!("{}/model/{}/invoke", self.endpoint, self.model_id);

        let body = json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": self.max_tokens,
            "messages": [
                {"role": "user", "content": [{"type": "text", "text": prompt}]}
            ],
            "temperature": 0,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::generation)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "hosted model error {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::generation)?;

        payload["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::Generation(
                    "hosted model response missing content text".to_string(),
                )
            })
    }
}
