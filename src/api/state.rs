use std::sync::Arc;

use crate::api::queue::JobQueue;
use crate::api::ApiError;
use crate::application::RagService;
use crate::domain::ports::CheckpointStore;
use crate::infrastructure::{AppConfig, RedisPool};

/// Shared handler state. Retrieval and checkpoint access are optional so the
/// API can start while Qdrant is down; the affected routes answer 503.
#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub jobs: JobQueue,
    pub rag: Option<Arc<RagService>>,
    pub checkpoints: Option<Arc<dyn CheckpointStore>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(redis_pool: RedisPool, config: AppConfig) -> Self {
        let jobs = JobQueue::new(redis_pool.clone(), config.config.worker.result_ttl_seconds);
        Self {
            redis_pool,
            jobs,
            rag: None,
            checkpoints: None,
            config: Arc::new(config),
        }
    }

    pub fn with_rag_service(self, rag: Arc<RagService>) -> Self {
        Self {
            rag: Some(rag),
            ..self
        }
    }

    pub fn with_checkpoints(self, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            checkpoints: Some(store),
            ..self
        }
    }

    pub fn rag(&self) -> Result<&RagService, ApiError> {
        self.rag.as_deref().ok_or(ApiError::Unavailable("retrieval"))
    }

    pub fn checkpoints(&self) -> Result<&dyn CheckpointStore, ApiError> {
        self.checkpoints
            .as_deref()
            .ok_or(ApiError::Unavailable("checkpoint store"))
    }
}
