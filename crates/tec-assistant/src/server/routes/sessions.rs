//! Session management

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// DELETE /api/sessions/:id - Forget a conversation
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.sessions().remove(&id) {
        tracing::info!("Deleted session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::SessionNotFound(id))
    }
}
