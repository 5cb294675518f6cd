//! Service configuration.
//!
//! Configuration is a typed [`AppConfig`] loaded from an optional YAML file
//! (`RAGGATE_CONFIG_PATH`, falling back to `config.yml` in the data
//! directory) with environment-variable overrides for deployment plumbing.
//! The attribute allow-list lives here as a single value so the query-time
//! resolver and the ingestion-side index mapping read the same names.

pub mod paths;
pub mod validation;

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use paths::AppPaths;
pub use validation::validate_config;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub index: IndexConfig,
    pub models: ModelsConfig,
    pub retrieval: RetrievalConfig,
    pub attributes: AttributeConfig,
    /// Key required by the `/access` admin endpoints. When unset those
    /// endpoints are disabled.
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity provider.
    pub endpoint: String,
    /// Credential for the admin operations behind `/access`.
    pub admin_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            admin_token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base URL of the document index.
    pub endpoint: String,
    /// Index name the `_search` calls go to.
    pub index: String,
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index: "test-index".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Embedding provider name. The supported set is closed; anything but
    /// `bedrock` fails before a network call is made.
    pub embedding_provider: String,
    pub embedding_model_id: String,
    pub embedding_dimensions: usize,
    /// Base URL of the hosted model runtime (embeddings and hosted
    /// generation).
    pub runtime_endpoint: String,
    pub generation_model_id: String,
    /// Which generation backend answers are produced with: `hosted` or
    /// `selfhosted`. Resolved once per invocation.
    pub generation_backend: String,
    /// Base URL of the self-hosted inference endpoint (OpenAI-compatible).
    pub self_hosted_endpoint: String,
    pub self_hosted_model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            embedding_provider: "bedrock".to_string(),
            embedding_model_id: "amazon.titan-embed-text-v2:0".to_string(),
            embedding_dimensions: 1024,
            runtime_endpoint: String::new(),
            generation_model_id: "anthropic.claude-3-haiku-20240307-v1:0".to_string(),
            generation_backend: "hosted".to_string(),
            self_hosted_endpoint: String::new(),
            self_hosted_model: String::new(),
            max_tokens: 400,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidate count for the approximate nearest-neighbor query.
    pub candidate_k: u32,
    /// Number of top hits requested from the index.
    pub size: u32,
    /// Hits at or below this score are dropped; a top score at or below it
    /// means "no confident answer".
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_k: 10,
            size: 5,
            min_score: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Namespace prefix the identity provider puts on custom attributes.
    pub prefix: String,
    /// Attribute names governing document access. The same list extends
    /// the index mapping at ingestion time; it must never be duplicated as
    /// literals elsewhere.
    pub allowed: Vec<String>,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            prefix: "custom:".to_string(),
            allowed: vec!["department".to_string(), "access_level".to_string()],
        }
    }
}

impl AppConfig {
    /// Load configuration: YAML file if present, then environment
    /// overrides on top.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        let path = config_path(paths);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment overrides, named after the deployment's variable
    /// plumbing.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("AOS_ENDPOINT") {
            self.index.endpoint = v;
        }
        if let Ok(v) = env::var("AOS_INDEX") {
            self.index.index = v;
        }
        if let Ok(v) = env::var("IDENTITY_ENDPOINT") {
            self.identity.endpoint = v;
        }
        if let Ok(v) = env::var("IDENTITY_ADMIN_TOKEN") {
            self.identity.admin_token = Some(v);
        }
        if let Ok(v) = env::var("MODEL_RUNTIME_ENDPOINT") {
            self.models.runtime_endpoint = v;
        }
        if let Ok(v) = env::var("SELF_HOSTED_ENDPOINT") {
            self.models.self_hosted_endpoint = v;
        }
        if let Ok(v) = env::var("GENERATION_BACKEND") {
            self.models.generation_backend = v;
        }
        if let Ok(v) = env::var("CUSTOM_ATTRIBUTES") {
            self.attributes.allowed = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(v) = env::var("ADMIN_API_KEY") {
            self.admin_api_key = Some(v);
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("RAGGATE_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    paths.data_dir.join("config.yml")
}
