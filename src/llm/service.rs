use std::time::Duration;

use reqwest::Client;

use super::hosted::HostedProvider;
use super::provider::GenerationProvider;
use super::selfhosted::SelfHostedProvider;
use crate::core::config::ModelsConfig;
use crate::core::errors::PipelineError;

/// Hands out the generation backend selected by the configuration flag.
///
/// The underlying HTTP client is built once and shared; the provider value
/// itself is resolved per invocation so the flag is honored request by
/// request.
#[derive(Clone)]
pub struct LlmService {
    config: ModelsConfig,
    client: Client,
}

impl LlmService {
    pub fn new(config: ModelsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn generation_provider(&self) -> Result<Box<dyn GenerationProvider>, PipelineError> {
        match self.config.generation_backend.as_str() {
            "hosted" => Ok(Box::new(HostedProvider::new(
                &self.config,
                self.client.clone(),
            ))),
            "selfhosted" => Ok(Box::new(SelfHostedProvider::new(
                &self.config,
                self.client.clone(),
            ))),
            other => Err(PipelineError::UnsupportedProvider(other.to_string())),
        }
    }
}
