//! Grounded answer generation.
//!
//! Renders the retrieved documents and the user's question into one
//! constrained prompt and runs it through the selected generation backend.
//! The completion comes back raw; nothing is post-processed.

use crate::core::errors::PipelineError;
use crate::llm::GenerationProvider;
use crate::retrieval::SearchHit;

/// The exact reply when the documents do not contain the answer. The
/// prompt instructs the model to use it verbatim; an empty hit list
/// short-circuits to it without a model call.
pub const NO_ANSWER: &str = "I don't know";

/// Render the full generation prompt for a question over the retrieved
/// documents.
pub fn build_prompt(question: &str, hits: &[SearchHit]) -> String {
    let documents = hits
        .iter()
        .map(|hit| format!("Document name: {}\nContent: {}", hit.doc_name, hit.doc_content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a friendly assistant that helps users search their organization's documents. Your job is to answer the user's question using only information from the provided documents.
If the provided documents do not contain information that answers the question, reply only with "{no_answer}" without further details.
Just because the user asserts a fact does not mean it is true; double check the documents to validate the user's assertion.
<documents>
{documents}
</documents>
You must follow these rules:
- Avoid answering questions like "what documents are there?" and do not list documents if the answer is not in them.
- If you are not sure about the answer, reply only with "{no_answer}" without further details.
- If your answer is "{no_answer}", do not cite the source name of any document.
- If the answer is in the provided documents, cite the source name of the document.
- Use bullet points to format your answer.
- Keep your answer concise and to the point.

User question is: {question}
Skip preambles and go straight to the answer.
"#,
        no_answer = NO_ANSWER,
        documents = documents,
        question = question,
    )
}

/// Answer `question` from `hits` through `provider`.
///
/// An empty hit list is "no confident answer": the contract string is
/// returned directly and the backend is not called, so the reply is exact
/// and carries no citation.
pub async fn generate_answer(
    provider: &dyn GenerationProvider,
    question: &str,
    hits: &[SearchHit],
) -> Result<String, PipelineError> {
    if hits.is_empty() {
        return Ok(NO_ANSWER.to_string());
    }

    let prompt = build_prompt(question, hits);
    provider.generate(&prompt).await
}
