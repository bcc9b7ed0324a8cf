use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Connection, Pool};
use tracing::{debug, instrument};

use crate::domain::{ports::CheckpointStore, Conversation, DomainError, ThreadId};

/// Stores each thread as one JSON document. A save is a single `SET`, so
/// Redis serializes writes per thread.
pub struct RedisCheckpointStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisCheckpointStore {
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key(&self, thread_id: &ThreadId) -> String {
        format!("{}:{}", self.key_prefix, thread_id)
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::checkpoint(e.to_string()))
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Conversation>, DomainError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn
            .get(self.key(thread_id))
            .await
            .map_err(|e| DomainError::checkpoint(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| DomainError::checkpoint(format!("corrupt checkpoint: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self, conversation), fields(thread_id = %conversation.thread_id()))]
    async fn save(&self, conversation: &Conversation) -> Result<(), DomainError> {
        let json = serde_json::to_string(conversation)
            .map_err(|e| DomainError::checkpoint(e.to_string()))?;

        let mut conn = self.conn().await?;
        conn.set::<_, _, ()>(self.key(conversation.thread_id()), json)
            .await
            .map_err(|e| DomainError::checkpoint(e.to_string()))?;

        debug!(messages = conversation.len(), "checkpoint saved");
        Ok(())
    }
}
