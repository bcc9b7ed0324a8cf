use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::{state::AppState, ApiError};
use crate::domain::{Passage, RetrievalQuery};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub result_count: Option<i64>,
}

/// Runs the retrieval path directly, outside the agent.
pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Passage>>, ApiError> {
    let rag = state.rag()?;

    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }

    let count = state.config.config.retrieval.resolve_count(request.result_count);
    let result = rag
        .retrieve(&RetrievalQuery::new(request.query).with_result_count(count))
        .await?;

    Ok(Json(result.0))
}
