mod jobs;
mod thread_locks;

pub use jobs::{status_key, ChatJob, IngestJob, JobRecord, JobStatus, QueuedJob};
pub use thread_locks::ThreadLocks;

use deadpool_redis::{Config, Pool, Runtime};

use crate::domain::DomainError;

pub type RedisPool = Pool;

/// Builds the pool without connecting; the first checkout dials Redis.
pub fn create_pool(redis_url: &str) -> Result<RedisPool, DomainError> {
    Config::from_url(redis_url)
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| DomainError::internal(format!("redis pool: {e}")))
}
