use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::core::config::IndexConfig;
use crate::core::errors::PipelineError;

/// One raw hit as the index ranks it.
#[derive(Debug, Clone)]
pub struct RawHit {
    pub id: String,
    pub score: f32,
    pub doc_text: String,
}

/// The ranked portion of a `_search` response.
#[derive(Debug, Default)]
pub struct IndexHits {
    /// Best candidate score; absent when the index returned no candidates.
    pub max_score: Option<f32>,
    pub hits: Vec<RawHit>,
}

/// HTTP client for the document index's search API.
#[derive(Clone)]
pub struct IndexClient {
    endpoint: String,
    index: String,
    client: Client,
}

impl IndexClient {
    pub fn new(config: &IndexConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            client,
        })
    }

    /// Run one search call and parse the ranked hits. Any transport or
    /// shape problem aborts with a retrieval error; hits are never
    /// fabricated or partially returned.
    pub async fn search(&self, query: &Value) -> Result<IndexHits, PipelineError> {
        let url = format!("{}/{}/_search", self.endpoint, self.index);

        let res = self
            .client
            .post(&url)
            .json(query)
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "index error {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::retrieval)?;
        parse_hits(&payload)
    }
}

fn parse_hits(payload: &Value) -> Result<IndexHits, PipelineError> {
    let hits_obj = payload.get("hits").ok_or_else(|| {
        PipelineError::Retrieval("index response missing hits object".to_string())
    })?;

    let max_score = hits_obj
        .get("max_score")
        .and_then(|s| s.as_f64())
        .map(|s| s as f32);

    let raw = hits_obj
        .get("hits")
        .and_then(|h| h.as_array())
        .ok_or_else(|| {
            PipelineError::Retrieval("index response missing hits array".to_string())
        })?;

    let mut hits = Vec::with_capacity(raw.len());
    for hit in raw {
        let id = hit
            .get("_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PipelineError::Retrieval("index hit missing _id".to_string()))?;
        let score = hit
            .get("_score")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| PipelineError::Retrieval("index hit missing _score".to_string()))?;
        let doc_text = hit
            .pointer("/_source/doc_text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PipelineError::Retrieval("index hit missing doc_text source field".to_string())
            })?;

        hits.push(RawHit {
            id: id.to_string(),
            score: score as f32,
            doc_text: doc_text.to_string(),
        });
    }

    Ok(IndexHits { max_score, hits })
}
