//! API routes for the assistant server

pub mod chat;
pub mod search;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_body_size: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Chat - larger body limit for base64 images
        .route(
            "/chat",
            post(chat::chat).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/search", post(search::search))
        .route("/sessions/:id", delete(sessions::delete_session))
        .route("/info", get(info))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Tec AI Agent is running",
        "strategy": state.retriever().strategy(),
    }))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "tec-assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Tec, the Amman Arab University website assistant",
        "endpoints": {
            "GET /api/health": "Service status and retrieval strategy",
            "POST /api/chat": "Chat with Tec (message, session_id, image_url)",
            "POST /api/search": "Knowledge lookup without a completion call",
            "DELETE /api/sessions/:id": "Forget a conversation",
            "GET /api/info": "This listing"
        },
        "knowledge": {
            "records": state.corpus().len(),
            "strategy": state.retriever().strategy(),
            "contact_phone": state.corpus().contact_phone(),
        },
        "chat_enabled": state.assistant().is_ok(),
    }))
}
