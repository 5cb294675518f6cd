use std::fmt::Debug;

use async_trait::async_trait;

use crate::core::errors::PipelineError;

/// Generation capability behind the runtime backend flag.
///
/// Both backends take one fully rendered prompt and return the raw text
/// completion: single blocking call, no retry, no streaming.
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// return the backend name (e.g. "hosted", "selfhosted")
    fn name(&self) -> &str;

    /// single-shot completion for the rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;
}
