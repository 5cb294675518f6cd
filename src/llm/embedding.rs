use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::ModelsConfig;
use crate::core::errors::PipelineError;

/// Embedding providers the client knows how to talk to. The set is closed;
/// anything else fails before a request leaves the process.
const SUPPORTED_PROVIDERS: [&str; 1] = ["bedrock"];

/// Client for the hosted embedding model.
///
/// One outbound call per `embed`; results are never cached because query
/// freshness is preferred over cost. Retry policy is the caller's concern.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: String,
    model_id: String,
    endpoint: String,
    dimensions: usize,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(config: &ModelsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            provider: config.embedding_provider.clone(),
            model_id: config.embedding_model_id.clone(),
            endpoint: config.runtime_endpoint.trim_end_matches('/').to_string(),
            dimensions: config.embedding_dimensions,
            client,
        })
    }

    /// Convert `text` into its embedding vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(PipelineError::UnsupportedProvider(self.provider.clone()));
        }

        let url = format!("{}/model/{}/invoke", self.endpoint, self.model_id);
        let body = json!({
            "inputText": text,
            "dimensions": self.dimensions,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "embedding model error {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::retrieval)?;
        parse_embedding(&payload)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, PipelineError> {
    let values = payload
        .get("embedding")
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            PipelineError::Retrieval("embedding response missing embedding field".to_string())
        })?;

    Ok(values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect())
}
