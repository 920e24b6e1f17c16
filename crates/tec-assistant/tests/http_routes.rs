//! HTTP routes driven through the router with in-process providers

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tec_assistant::{
    config::{AssistantConfig, RetrievalStrategy},
    providers::{Completion, CompletionProvider, EmbeddingProvider, ToolDefinition},
    retrieval::{KeywordRetriever, SemanticRetriever},
    server::{state::AppState, AssistantServer},
    Assistant, ChatMessage, Corpus, Error, InMemorySessionStore, Result, Retriever,
    SessionStore,
};

/// Answers every request with a fixed reply, or fails when `fail` is set
struct FixedLlm {
    reply: &'static str,
    fail: bool,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FixedLlm {
    fn new(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            fail: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: "",
            fail: true,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionProvider for FixedLlm {
    async fn complete(&self, messages: &[ChatMessage], _tools: &[ToolDefinition]) -> Result<Completion> {
        self.seen.lock().push(messages.to_vec());
        if self.fail {
            return Err(Error::llm("HTTP 503 Service Unavailable"));
        }
        Ok(Completion::text(self.reply))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn model(&self) -> &str {
        "fixed-model"
    }
}

/// Embedding backend that is always unreachable
struct DownEmbedder;

#[async_trait]
impl EmbeddingProvider for DownEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("connection refused"))
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "down"
    }
}

struct Harness {
    router: Router,
    sessions: Arc<dyn SessionStore>,
}

fn harness(llm: Option<Arc<FixedLlm>>) -> Harness {
    let corpus = Arc::new(Corpus::builtin().unwrap());
    let retriever: Arc<dyn Retriever> = Arc::new(KeywordRetriever::new(corpus));
    let assistant = llm.map(|llm| Assistant::new(llm, Arc::clone(&retriever)));
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::default());

    let state = AppState::from_parts(
        AssistantConfig::default(),
        retriever,
        assistant,
        Arc::clone(&sessions),
    );
    Harness {
        router: AssistantServer::with_state(state).build_router(),
        sessions,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_endpoints() {
    let h = harness(None);

    let (status, body) = send(&h.router, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, _) = send(&h.router, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&h.router, Request::get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Tec AI Agent is running");
    assert_eq!(body["strategy"], "keyword");
}

#[tokio::test]
async fn search_returns_matched_record() {
    let h = harness(None);
    let (status, body) = post_json(&h.router, "/api/search", json!({"query": "ما هو رقم الهاتف؟"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["category"], "contact");
    assert_eq!(body["score"], 2.0);
}

#[tokio::test]
async fn search_without_match_returns_fallback() {
    let h = harness(None);
    let (status, body) = post_json(&h.router, "/api/search", json!({"query": "asdkjasjd random gibberish"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], false);
    assert!(body["answer"].as_str().unwrap().contains("0798877440"));
    assert!(body.get("category").is_none());
}

#[tokio::test]
async fn search_requires_query() {
    let h = harness(None);
    let (status, body) = post_json(&h.router, "/api/search", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "malformed_input");
}

#[tokio::test]
async fn search_with_empty_query_returns_fallback() {
    let h = harness(None);
    for query in ["", "   "] {
        let (status, body) = post_json(&h.router, "/api/search", json!({ "query": query })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matched"], false);
        assert!(body["answer"].as_str().unwrap().contains("0798877440"));
    }
}

#[tokio::test]
async fn semantic_search_embedding_failure_is_bad_gateway() {
    let corpus = Arc::new(Corpus::builtin().unwrap());
    let record_embeddings = vec![vec![1.0, 0.0, 0.0]; corpus.len()];
    let retriever: Arc<dyn Retriever> = Arc::new(
        SemanticRetriever::with_embeddings(corpus, Arc::new(DownEmbedder), record_embeddings, 0.5)
            .unwrap(),
    );
    let mut config = AssistantConfig::default();
    config.retrieval.strategy = RetrievalStrategy::Semantic;
    let state = AppState::from_parts(
        config,
        retriever,
        None,
        Arc::new(InMemorySessionStore::default()),
    );
    let router = AssistantServer::with_state(state.clone()).build_router();

    let (status, body) = post_json(&router, "/api/search", json!({"query": "ما هو رقم الهاتف؟"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "embedding_error");

    let (status, body) = send(&router, Request::get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["strategy"], "semantic");

    assert!(!state.refresh_readiness().await);
    let (status, _) = send(&router, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn readiness_follows_completion_health() {
    let corpus = Arc::new(Corpus::builtin().unwrap());
    let retriever: Arc<dyn Retriever> = Arc::new(KeywordRetriever::new(corpus));

    let healthy = AppState::from_parts(
        AssistantConfig::default(),
        Arc::clone(&retriever),
        Some(Assistant::new(FixedLlm::new("ok"), Arc::clone(&retriever))),
        Arc::new(InMemorySessionStore::default()),
    );
    assert!(healthy.refresh_readiness().await);
    assert!(healthy.is_ready());

    let down = AppState::from_parts(
        AssistantConfig::default(),
        Arc::clone(&retriever),
        Some(Assistant::new(FixedLlm::failing(), Arc::clone(&retriever))),
        Arc::new(InMemorySessionStore::default()),
    );
    assert!(!down.refresh_readiness().await);
    assert!(!down.is_ready());
}

#[tokio::test]
async fn chat_creates_session_and_replays_history() {
    let llm = FixedLlm::new("أهلاً بك في جامعة عمان العربية! 🎓");
    let h = harness(Some(llm.clone()));

    let (status, first) = post_json(&h.router, "/api/chat", json!({"message": "مرحبا"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["response"], "أهلاً بك في جامعة عمان العربية! 🎓");
    let session_id = first["session_id"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());
    assert_eq!(h.sessions.history(&session_id).len(), 2);

    let (status, second) = post_json(
        &h.router,
        "/api/chat",
        json!({"message": "ما هي الرسوم؟", "session_id": session_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session_id"], session_id.as_str());

    // system, previous user and assistant turns, new user turn
    let seen = llm.seen.lock();
    assert_eq!(seen[1].len(), 4);
    assert_eq!(seen[1][1].text(), Some("مرحبا"));
    assert_eq!(h.sessions.history(&session_id).len(), 4);
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let h = harness(Some(FixedLlm::new("unused")));
    let (status, body) = post_json(&h.router, "/api/chat", json!({"message": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "malformed_input");
}

#[tokio::test]
async fn chat_rejects_invalid_image() {
    let h = harness(Some(FixedLlm::new("unused")));
    let (status, _) = post_json(
        &h.router,
        "/api/chat",
        json!({"message": "ما هذا؟", "image_url": "data:image/png;base64,@@@"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_provider_failure_apologises_with_phone() {
    let h = harness(Some(FixedLlm::failing()));
    let (status, body) = post_json(&h.router, "/api/chat", json!({"message": "مرحبا"})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("503"));
    assert!(body["response"].as_str().unwrap().contains("0798877440"));
    assert!(h.sessions.is_empty());
}

#[tokio::test]
async fn chat_without_completion_provider_is_unavailable() {
    let h = harness(None);
    let (status, body) = post_json(&h.router, "/api/chat", json!({"message": "مرحبا"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["response"].as_str().unwrap().contains("0798877440"));
}

#[tokio::test]
async fn delete_session() {
    let h = harness(Some(FixedLlm::new("ok")));
    let (_, body) = post_json(
        &h.router,
        "/api/chat",
        json!({"message": "hello", "session_id": "visitor-1"}),
    )
    .await;
    assert_eq!(body["session_id"], "visitor-1");

    let delete = || {
        Request::delete("/api/sessions/visitor-1")
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&h.router, delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&h.router, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn info_lists_endpoints() {
    let h = harness(None);
    let (status, body) = send(&h.router, Request::get("/api/info").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["name"], "tec-assistant");
    assert_eq!(body["chat_enabled"], false);
    assert!(body["endpoints"]["POST /api/chat"].is_string());
}
