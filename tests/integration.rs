//! End-to-end tests over the real router.
//!
//! The identity provider, document index, and model runtime are stood up
//! as local axum servers with per-route call counters, so the tests can
//! assert not only on responses but on which upstream calls were (and
//! were not) made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use raggate::core::config::AppConfig;
use raggate::server::router::router;
use raggate::state::AppState;

#[derive(Default)]
struct Counters {
    identity: AtomicUsize,
    index: AtomicUsize,
    embed: AtomicUsize,
    generate: AtomicUsize,
}

#[derive(Clone)]
struct MockDoc {
    id: &'static str,
    text: &'static str,
    score: f64,
    attrs: &'static [(&'static str, &'static str)],
}

struct MockState {
    counters: Counters,
    /// token -> (username, provider attributes)
    users: HashMap<String, (String, Vec<(String, String)>)>,
    docs: Vec<MockDoc>,
    /// prompts the generation backend received
    prompts: Mutex<Vec<String>>,
    /// admin attribute updates received by the identity provider
    updates: Mutex<Vec<(String, Value)>>,
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

// ---- mock identity provider ----

async fn mock_get_user(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.counters.identity.fetch_add(1, Ordering::SeqCst);

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    match state.users.get(token) {
        Some((username, attrs)) => {
            let attributes: Vec<Value> = attrs
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            (
                StatusCode::OK,
                Json(json!({ "username": username, "attributes": attributes })),
            )
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "code": "NotAuthorizedException",
                "message": "Invalid Access Token"
            })),
        ),
    }
}

async fn mock_update_attributes(
    State(state): State<Arc<MockState>>,
    Path(username): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.updates.lock().unwrap().push((username, body));
    Json(json!({}))
}

async fn mock_list_users(State(state): State<Arc<MockState>>) -> Json<Value> {
    let users: Vec<Value> = state
        .users
        .values()
        .map(|(username, attrs)| {
            let attributes: Vec<Value> = attrs
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            json!({ "username": username, "attributes": attributes })
        })
        .collect();
    Json(json!({ "users": users }))
}

// ---- mock document index ----

fn doc_matches(doc: &MockDoc, filter: Option<&Value>) -> bool {
    let Some(must) = filter
        .and_then(|f| f.pointer("/bool/must"))
        .and_then(|m| m.as_array())
    else {
        // No filter matches every document.
        return true;
    };

    must.iter().all(|clause| {
        let Some(terms) = clause.get("terms").and_then(|t| t.as_object()) else {
            return false;
        };
        terms.iter().all(|(name, values)| {
            let Some(doc_value) = doc
                .attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| *v)
            else {
                return false;
            };
            values
                .as_array()
                .map(|vs| vs.iter().any(|v| v.as_str() == Some(doc_value)))
                .unwrap_or(false)
        })
    })
}

async fn mock_search(
    State(state): State<Arc<MockState>>,
    Json(query): Json<Value>,
) -> Json<Value> {
    state.counters.index.fetch_add(1, Ordering::SeqCst);

    let knn = &query["query"]["knn"]["doc_embedding"];
    let filter = knn.get("filter");
    let size = query["size"].as_u64().unwrap_or(5) as usize;

    let mut matched: Vec<&MockDoc> = state
        .docs
        .iter()
        .filter(|doc| doc_matches(doc, filter))
        .collect();
    matched.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    matched.truncate(size);

    let hits: Vec<Value> = matched
        .iter()
        .map(|doc| {
            json!({
                "_id": doc.id,
                "_score": doc.score,
                "_source": { "doc_text": doc.text }
            })
        })
        .collect();

    let max_score = matched.first().map(|doc| doc.score);

    Json(json!({ "hits": { "max_score": max_score, "hits": hits } }))
}

// ---- mock model runtime (embeddings + hosted generation) ----

async fn mock_invoke_model(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Some(dimensions) = body.get("dimensions").and_then(|d| d.as_u64()) {
        state.counters.embed.fetch_add(1, Ordering::SeqCst);
        let vector: Vec<f64> = (0..dimensions).map(|i| (i % 7) as f64 * 0.1).collect();
        return Json(json!({ "embedding": vector }));
    }

    state.counters.generate.fetch_add(1, Ordering::SeqCst);
    let prompt = body
        .pointer("/messages/0/content/0/text")
        .and_then(|t| t.as_str())
        .unwrap_or_default();
    state.prompts.lock().unwrap().push(prompt.to_string());

    Json(json!({
        "content": [{ "type": "text", "text": "- canned grounded answer" }]
    }))
}

// ---- mock self-hosted inference endpoint ----

async fn mock_chat_completions(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.counters.generate.fetch_add(1, Ordering::SeqCst);
    let prompt = body
        .pointer("/messages/0/content")
        .and_then(|t| t.as_str())
        .unwrap_or_default();
    state.prompts.lock().unwrap().push(prompt.to_string());

    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "- self-hosted answer" } }]
    }))
}

// ---- environment assembly ----

struct TestEnv {
    base_url: String,
    mocks: Arc<MockState>,
    client: reqwest::Client,
}

impl TestEnv {
    async fn start(docs: Vec<MockDoc>, configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut users = HashMap::new();
        users.insert(
            "confidential-token".to_string(),
            (
                "alice".to_string(),
                vec![("custom:access_level".to_string(), "confidential".to_string())],
            ),
        );
        users.insert(
            "eng-token".to_string(),
            (
                "bob".to_string(),
                vec![
                    ("custom:department".to_string(), "eng, sales".to_string()),
                    ("custom:access_level".to_string(), "support".to_string()),
                ],
            ),
        );

        let mocks = Arc::new(MockState {
            counters: Counters::default(),
            users,
            docs,
            prompts: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        });

        let identity_app = Router::new()
            .route("/user", post(mock_get_user))
            .route(
                "/admin/users/:username/attributes",
                post(mock_update_attributes),
            )
            .route("/admin/users", get(mock_list_users))
            .with_state(mocks.clone());
        let index_app = Router::new()
            .route("/:index/_search", post(mock_search))
            .with_state(mocks.clone());
        let runtime_app = Router::new()
            .route("/model/:model_id/invoke", post(mock_invoke_model))
            .with_state(mocks.clone());
        let selfhosted_app = Router::new()
            .route("/v1/chat/completions", post(mock_chat_completions))
            .with_state(mocks.clone());

        let identity_url = spawn(identity_app).await;
        let index_url = spawn(index_app).await;
        let runtime_url = spawn(runtime_app).await;
        let selfhosted_url = spawn(selfhosted_app).await;

        let mut config = AppConfig::default();
        config.identity.endpoint = identity_url;
        config.identity.admin_token = Some("identity-admin-token".to_string());
        config.index.endpoint = index_url;
        config.index.index = "test-index".to_string();
        config.models.runtime_endpoint = runtime_url;
        config.models.self_hosted_endpoint = selfhosted_url;
        config.models.self_hosted_model = "local-model".to_string();
        config.admin_api_key = Some("test-admin-key".to_string());
        configure(&mut config);

        let state = AppState::from_config(config).expect("state");
        let base_url = spawn(router(state)).await;

        Self {
            base_url,
            mocks,
            client: reqwest::Client::new(),
        }
    }

    async fn invoke(&self, token: Option<&str>, body: Option<Value>) -> reqwest::Response {
        let mut req = self.client.post(format!("{}/invoke", self.base_url));
        if let Some(token) = token {
            req = req.header("x-access-token", token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send().await.expect("invoke request")
    }
}

fn default_docs() -> Vec<MockDoc> {
    vec![
        MockDoc {
            id: "secret-plan.txt",
            text: "The launch is in October.",
            score: 0.9,
            attrs: &[("access_level", "confidential")],
        },
        MockDoc {
            id: "lunch-menu.txt",
            text: "Tacos on Tuesday.",
            score: 0.95,
            attrs: &[("access_level", "public")],
        },
    ]
}

// ---- tests ----

#[tokio::test]
async fn end_to_end_only_eligible_documents_reach_the_model() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "prompt": "when is the launch?" })),
        )
        .await;

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "ai");
    assert_eq!(body["content"], "- canned grounded answer");

    // The public document scored higher but is not eligible; only the
    // confidential one may appear in the generation prompt.
    let prompts = env.mocks.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("secret-plan.txt"));
    assert!(!prompts[0].contains("lunch-menu.txt"));
}

#[tokio::test]
async fn options_preflight_answers_without_any_upstream_call() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/invoke", env.base_url),
        )
        .send()
        .await
        .expect("options request");

    assert_eq!(res.status(), 200);
    let allow_origin = res
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert_eq!(allow_origin, "*");
    let allow_methods = res
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(allow_methods.contains("OPTIONS"));

    assert_eq!(env.mocks.counters.identity.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.index.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.embed.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_token_short_circuits_before_any_downstream_call() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env.invoke(None, Some(json!({ "prompt": "hello" }))).await;

    assert_eq!(res.status(), 401);
    assert_eq!(env.mocks.counters.identity.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.index.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_prompt_short_circuits_before_any_downstream_call() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env.invoke(Some("confidential-token"), None).await;
    assert_eq!(res.status(), 400);

    let res = env
        .invoke(Some("confidential-token"), Some(json!({ "prompt": "  " })))
        .await;
    assert_eq!(res.status(), 400);

    assert_eq!(env.mocks.counters.identity.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_token_becomes_an_error_answer_with_the_provider_pair() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .invoke(Some("bogus-token"), Some(json!({ "prompt": "hello" })))
        .await;

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "error");
    let content = body["content"].as_str().unwrap_or("");
    assert!(content.contains("NotAuthorizedException"));
    assert!(content.contains("Invalid Access Token"));

    // The pipeline stopped at the identity step.
    assert_eq!(env.mocks.counters.index.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn low_relevance_hits_answer_i_dont_know_without_generation() {
    let docs = vec![MockDoc {
        id: "barely-related.txt",
        text: "Something tangential.",
        score: 0.2,
        attrs: &[("access_level", "confidential")],
    }];
    let env = TestEnv::start(docs, |_| {}).await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "prompt": "when is the launch?" })),
        )
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "ai");
    assert_eq!(body["content"], "I don't know");
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_matching_documents_answer_i_dont_know() {
    // The eng token carries department/access_level values no document has.
    let docs = vec![MockDoc {
        id: "secret-plan.txt",
        text: "The launch is in October.",
        score: 0.9,
        attrs: &[
            ("department", "finance"),
            ("access_level", "confidential"),
        ],
    }];
    let env = TestEnv::start(docs, |_| {}).await;

    let res = env
        .invoke(Some("eng-token"), Some(json!({ "prompt": "launch date?" })))
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "ai");
    assert_eq!(body["content"], "I don't know");
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsupported_embedding_provider_fails_before_any_model_call() {
    let env = TestEnv::start(default_docs(), |config| {
        config.models.embedding_provider = "sagemaker".to_string();
    })
    .await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "prompt": "hello" })),
        )
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "error");
    assert_eq!(
        body["content"],
        "The configured model provider is not supported."
    );

    assert_eq!(env.mocks.counters.embed.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.index.load(Ordering::SeqCst), 0);
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn index_failure_becomes_a_user_safe_error_answer() {
    let env = TestEnv::start(default_docs(), |config| {
        // Nothing listens here; the search call fails outright.
        config.index.endpoint = "http://127.0.0.1:1".to_string();
    })
    .await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "prompt": "hello" })),
        )
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "error");
    assert_eq!(
        body["content"],
        "The document search backend is currently unavailable."
    );
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn selfhosted_backend_answers_through_the_chat_endpoint() {
    let env = TestEnv::start(default_docs(), |config| {
        config.models.generation_backend = "selfhosted".to_string();
    })
    .await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "prompt": "when is the launch?" })),
        )
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "ai");
    assert_eq!(body["content"], "- self-hosted answer");
    assert_eq!(env.mocks.counters.generate.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn query_field_is_accepted_as_a_prompt_alias() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .invoke(
            Some("confidential-token"),
            Some(json!({ "query": "when is the launch?" })),
        )
        .await;

    let body: Value = res.json().await.expect("body");
    assert_eq!(body["type"], "ai");
}

#[tokio::test]
async fn access_endpoints_require_the_admin_key() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .client
        .get(format!("{}/access", env.base_url))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 401);

    let res = env
        .client
        .get(format!("{}/access", env.base_url))
        .header("x-admin-key", "wrong")
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn access_get_lists_users_with_attributes() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .client
        .get(format!("{}/access", env.base_url))
        .header("x-admin-key", "test-admin-key")
        .send()
        .await
        .expect("request");

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("body");
    let users = body["users"].as_array().expect("users");
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u["username"] == "alice"));
}

#[tokio::test]
async fn access_post_forwards_the_update_and_confirms() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .client
        .post(format!("{}/access", env.base_url))
        .header("x-admin-key", "test-admin-key")
        .json(&json!({
            "username": "alice",
            "attributes": [
                { "name": "custom:access_level", "value": "support" }
            ]
        }))
        .send()
        .await
        .expect("request");

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("body");
    assert_eq!(body, json!("User 'alice' updated successfully."));

    let updates = env.mocks.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "alice");
    assert_eq!(
        updates[0].1["attributes"][0]["name"],
        "custom:access_level"
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let env = TestEnv::start(default_docs(), |_| {}).await;

    let res = env
        .client
        .get(format!("{}/health", env.base_url))
        .send()
        .await
        .expect("request");

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("body");
    assert_eq!(body["status"], "ok");
}
