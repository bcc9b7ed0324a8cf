pub mod chat;
pub mod health;
pub mod jobs;
pub mod search;
pub mod threads;

use axum::http::{header, Method};
use axum::{routing::get, routing::post, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat_handler))
        .route("/chat/jobs/{job_id}", get(jobs::get_job_status))
        .route("/jobs/{job_id}", get(jobs::get_job_status))
        .route("/threads/{thread_id}", get(threads::get_thread))
        .route("/search", post(search::search_documents))
        .route("/ingest", post(jobs::ingest_handler))
}
