use serde_json::{json, Map, Value};

use crate::identity::AccessAttributeSet;

/// Build the approximate nearest-neighbor query with the access filter
/// attached.
///
/// Per attribute name the allowed values become one `terms` clause (the
/// document's field must equal any of them); the clauses are combined
/// under `bool.must`, so a document has to satisfy every attribute's
/// clause to be a candidate. An empty attribute set produces no filter at
/// all, which the index treats as matching every document.
pub fn build_knn_query(
    vector: &[f32],
    attributes: &AccessAttributeSet,
    candidate_k: u32,
    size: u32,
) -> Value {
    let mut knn = json!({
        "vector": vector,
        "k": candidate_k,
    });

    if !attributes.is_empty() {
        let must: Vec<Value> = attributes
            .iter()
            .map(|(name, values)| {
                let mut clause = Map::new();
                clause.insert(
                    name.clone(),
                    Value::Array(
                        values
                            .iter()
                            .map(|v| Value::String(v.clone()))
                            .collect(),
                    ),
                );
                json!({ "terms": clause })
            })
            .collect();

        knn["filter"] = json!({ "bool": { "must": must } });
    }

    json!({
        "size": size,
        "query": { "knn": { "doc_embedding": knn } }
    })
}
