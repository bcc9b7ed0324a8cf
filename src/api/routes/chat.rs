use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::jobs::QueuedResponse;
use crate::api::{state::AppState, ApiError};
use crate::domain::ThreadId;
use crate::infrastructure::ChatJob;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub thread_id: String,
    pub message: String,
}

/// Queues one agent turn. The answer is read back through the job status
/// route once the worker has run it.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    if request.thread_id.trim().is_empty() {
        return Err(ApiError::BadRequest("thread_id must not be empty".into()));
    }
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let job = ChatJob::new(ThreadId::new(request.thread_id), request.message);
    let job_id = state.jobs.enqueue(&job).await?;

    Ok(QueuedResponse::accepted(job_id))
}
