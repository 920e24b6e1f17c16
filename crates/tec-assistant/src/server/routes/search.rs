//! Retrieval-only lookup

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::retrieval::Retrieval;
use crate::server::state::AppState;
use crate::types::{SearchRequest, SearchResponse};

/// POST /api/search - Run the retriever without a completion call
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    // an empty query is valid and resolves to the fallback
    let query = request
        .query
        .as_deref()
        .ok_or_else(|| Error::malformed("query is required"))?;

    tracing::info!("Search: \"{}\"", query);

    let response = match state.retriever().search(query).await? {
        Retrieval::Matched {
            category,
            answer,
            score,
        } => SearchResponse {
            answer,
            matched: true,
            category: Some(category),
            score: Some(score),
        },
        Retrieval::NoMatch => SearchResponse {
            answer: state.corpus().fallback().to_string(),
            matched: false,
            category: None,
            score: None,
        },
    };

    Ok(Json(response))
}
