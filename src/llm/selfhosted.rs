use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationProvider;
use crate::core::config::ModelsConfig;
use crate::core::errors::PipelineError;

/// Generation through a self-hosted, OpenAI-compatible inference endpoint.
#[derive(Clone, Debug)]
pub struct SelfHostedProvider {
    base_url: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl SelfHostedProvider {
    pub fn new(config: &ModelsConfig, client: Client) -> Self {
        Self {
            base_url: config.self_hosted_endpoint.trim_end_matches('/').to_string(),
            model: config.self_hosted_model.clone(),
            max_tokens: config.max_tokens,
            client,
        }
    }
}

#[async_trait]
impl GenerationProvider for SelfHostedProvider {
    fn name(&self) -> &str {
        "selfhosted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
            "temperature": 0,
            "max_tokens": self.max_tokens,
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
                "self-hosted model error {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::generation)?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                PipelineError::Generation(
                    "self-hosted model response missing message content".to_string(),
                )
            })
    }
}
