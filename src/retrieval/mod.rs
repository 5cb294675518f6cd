//! Attribute-filtered vector retrieval.
//!
//! Embeds the query text, attaches the caller's access filter to one
//! nearest-neighbor query, and reduces the response to relevance-checked
//! hits. A top score at or below the cutoff means "no confident answer"
//! and yields an empty result rather than an error.

pub mod index;
pub mod query;

use serde::{Deserialize, Serialize};

use crate::core::config::RetrievalConfig;
use crate::core::errors::PipelineError;
use crate::identity::AccessAttributeSet;
use crate::llm::EmbeddingClient;

use index::{IndexClient, IndexHits};

/// A retrieved document reduced to what the answer layer needs, in the
/// index's descending-score order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_name: String,
    pub score: f32,
    pub doc_content: String,
}

pub struct Retriever {
    embedder: EmbeddingClient,
    index: IndexClient,
    options: RetrievalConfig,
}

impl Retriever {
    pub fn new(embedder: EmbeddingClient, index: IndexClient, options: RetrievalConfig) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    /// Run the filtered retrieval pipeline for one query.
    pub async fn search(
        &self,
        query_text: &str,
        attributes: &AccessAttributeSet,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        let vector = self.embedder.embed(query_text).await?;
        let body = query::build_knn_query(
            &vector,
            attributes,
            self.options.candidate_k,
            self.options.size,
        );

        let hits = self.index.search(&body).await?;
        Ok(apply_relevance_cutoff(hits, self.options.min_score))
    }
}

/// Drop results the index itself is not confident about. When the best
/// candidate scores at or below the cutoff (or there are no candidates at
/// all) the whole result is empty; otherwise only hits strictly above the
/// cutoff survive, keeping the index's ranking order.
fn apply_relevance_cutoff(hits: IndexHits, min_score: f32) -> Vec<SearchHit> {
    match hits.max_score {
        Some(max) if max > min_score => hits
            .hits
            .into_iter()
            .filter(|hit| hit.score > min_score)
            .map(|hit| SearchHit {
                doc_name: hit.id,
                score: hit.score,
                doc_content: hit.doc_text,
            })
            .collect(),
        _ => Vec::new(),
    }
}
