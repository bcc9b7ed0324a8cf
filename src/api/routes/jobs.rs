use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{state::AppState, ApiError};
use crate::infrastructure::{IngestJob, JobRecord, JobStatus};

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}

impl QueuedResponse {
    pub fn accepted(job_id: Uuid) -> (StatusCode, Json<Self>) {
        (
            StatusCode::ACCEPTED,
            Json(Self {
                job_id,
                status: JobStatus::Queued,
            }),
        )
    }
}

pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .jobs
        .status(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))
}

/// Queues a full refresh of the document index.
pub async fn ingest_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    let job_id = state.jobs.enqueue(&IngestJob::new()).await?;
    Ok(QueuedResponse::accepted(job_id))
}
