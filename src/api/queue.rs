use deadpool_redis::{redis::AsyncCommands, Connection};
use uuid::Uuid;

use crate::infrastructure::{status_key, JobRecord, QueuedJob, RedisPool};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<deadpool_redis::redis::RedisError> for QueueError {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        Self::Redis(e.to_string())
    }
}

/// Producer side of the Redis job lists. Every enqueued job gets a `queued`
/// status record that the worker later overwrites.
#[derive(Clone)]
pub struct JobQueue {
    pool: RedisPool,
    status_ttl: u64,
}

impl JobQueue {
    pub fn new(pool: RedisPool, status_ttl: u64) -> Self {
        Self { pool, status_ttl }
    }

    async fn conn(&self) -> Result<Connection, QueueError> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Pool(e.to_string()))
    }

    pub async fn enqueue<J: QueuedJob>(&self, job: &J) -> Result<Uuid, QueueError> {
        let job_id = job.job_id();
        let record = serde_json::to_string(&JobRecord::queued(job_id))?;
        let payload = serde_json::to_string(job)?;

        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(status_key(&job_id), record, self.status_ttl)
            .await?;
        conn.lpush::<_, _, ()>(J::QUEUE, payload).await?;

        tracing::info!(%job_id, queue = J::QUEUE, "job queued");
        Ok(job_id)
    }

    pub async fn status(&self, job_id: &Uuid) -> Result<Option<JobRecord>, QueueError> {
        let raw: Option<String> = self.conn().await?.get(status_key(job_id)).await?;
        Ok(raw.map(|json| serde_json::from_str(&json)).transpose()?)
    }
}
