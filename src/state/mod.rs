use std::sync::Arc;

use crate::core::config::{validate_config, AppConfig, AppPaths};
use crate::identity::IdentityClient;
use crate::llm::{EmbeddingClient, LlmService};
use crate::retrieval::index::IndexClient;
use crate::retrieval::Retriever;

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// The clients inside hold their HTTP connection pools; they are built
/// once here and reused across invocations. Nothing else is shared
/// between requests, so concurrent invocations never contend.
pub struct AppState {
    pub config: AppConfig,
    pub identity: IdentityClient,
    pub retriever: Retriever,
    pub llm: LlmService,
}

impl AppState {
    /// Load and validate configuration, then build the state.
    pub fn initialize(paths: &AppPaths) -> Result<Arc<Self>, InitializationError> {
        let config = AppConfig::load(paths).map_err(InitializationError::Config)?;
        validate_config(&config).map_err(InitializationError::Config)?;
        Self::from_config(config)
    }

    /// Build the state from an already-validated configuration. Used
    /// directly by tests that point the clients at local servers.
    pub fn from_config(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let identity = IdentityClient::new(&config.identity, config.attributes.clone())
            .map_err(InitializationError::HttpClient)?;

        let embedder =
            EmbeddingClient::new(&config.models).map_err(InitializationError::HttpClient)?;
        let index = IndexClient::new(&config.index).map_err(InitializationError::HttpClient)?;
        let retriever = Retriever::new(embedder, index, config.retrieval.clone());

        let llm = LlmService::new(config.models.clone()).map_err(InitializationError::HttpClient)?;

        Ok(Arc::new(AppState {
            config,
            identity,
            retriever,
            llm,
        }))
    }
}
