use anyhow::{bail, Result};

use super::AppConfig;

const GENERATION_BACKENDS: [&str; 2] = ["hosted", "selfhosted"];

/// Startup validation. A bad value here is a deployment mistake; failing
/// early beats failing on the first request.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.index.endpoint.trim().is_empty() {
        bail!("index.endpoint must be set (or AOS_ENDPOINT)");
    }
    if config.index.index.trim().is_empty() {
        bail!("index.index must be set (or AOS_INDEX)");
    }
    if config.identity.endpoint.trim().is_empty() {
        bail!("identity.endpoint must be set (or IDENTITY_ENDPOINT)");
    }

    if config.retrieval.candidate_k == 0 || config.retrieval.candidate_k > 1000 {
        bail!(
            "retrieval.candidate_k must be between 1 and 1000, got {}",
            config.retrieval.candidate_k
        );
    }
    if config.retrieval.size == 0 || config.retrieval.size > config.retrieval.candidate_k {
        bail!(
            "retrieval.size must be between 1 and candidate_k ({}), got {}",
            config.retrieval.candidate_k,
            config.retrieval.size
        );
    }
    if !(0.0..1.0).contains(&config.retrieval.min_score) {
        bail!(
            "retrieval.min_score must be in [0.0, 1.0), got {}",
            config.retrieval.min_score
        );
    }

    if !GENERATION_BACKENDS.contains(&config.models.generation_backend.as_str()) {
        bail!(
            "models.generation_backend must be one of {:?}, got {}",
            GENERATION_BACKENDS,
            config.models.generation_backend
        );
    }
    if config.models.generation_backend == "selfhosted"
        && config.models.self_hosted_endpoint.trim().is_empty()
    {
        bail!("models.self_hosted_endpoint must be set for the selfhosted backend");
    }
    if config.models.runtime_endpoint.trim().is_empty() {
        bail!("models.runtime_endpoint must be set (or MODEL_RUNTIME_ENDPOINT)");
    }

    if config.attributes.allowed.is_empty() {
        bail!("attributes.allowed must name at least one governing attribute");
    }

    Ok(())
}
