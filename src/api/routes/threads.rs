use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{state::AppState, ApiError};
use crate::domain::{Conversation, ThreadId};

/// Checkpointed message log of one thread.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let thread_id = ThreadId::new(thread_id);

    state
        .checkpoints()?
        .load(&thread_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("thread {thread_id}")))
}
