pub mod embedding;
pub mod hosted;
pub mod provider;
pub mod selfhosted;
pub mod service;

pub use embedding::EmbeddingClient;
pub use provider::GenerationProvider;
pub use service::LlmService;
