//! Chat endpoint

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::image::ImageInput;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /api/chat - Answer a message within a session
///
/// Provider failures keep the error status but also carry an apology with
/// the university phone number, so a client can always show a next step.
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    match handle_chat(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) if e.is_provider_failure() => {
            tracing::error!("Chat failed: {}", e);
            let (status, _) = e.status_and_type();
            let body = json!({
                "error": e.to_string(),
                "response": state.corpus().apology(),
            });
            (status, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn handle_chat(state: &AppState, request: ChatRequest) -> Result<ChatResponse> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(Error::malformed("message is required"));
    }

    let image = request
        .image_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(ImageInput::parse)
        .transpose()?;

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!("Chat [{}]: \"{}\"", session_id, message);

    let assistant = state.assistant()?;
    let history = state.sessions().history(&session_id);
    let reply = assistant.reply(&history, message, image.as_ref()).await?;

    state.sessions().append(&session_id, reply.turns);

    Ok(ChatResponse {
        response: reply.answer,
        session_id,
    })
}
