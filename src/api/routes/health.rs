use axum::{extract::State, http::StatusCode, Json};
use deadpool_redis::redis::cmd;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub redis: bool,
    pub retrieval: bool,
    pub checkpoints: bool,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn redis_reachable(state: &AppState) -> bool {
    let Ok(mut conn) = state.redis_pool.get().await else {
        return false;
    };
    let pong: Result<String, _> = cmd("PING").query_async(&mut *conn).await;
    pong.is_ok()
}

/// Ready once Redis answers. Retrieval and checkpoints are reported but do
/// not gate readiness, since chat jobs only need the queue.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let redis = redis_reachable(&state).await;
    let code = if redis {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ReadinessResponse {
            ready: redis,
            redis,
            retrieval: state.rag.is_some(),
            checkpoints: state.checkpoints.is_some(),
        }),
    )
}
