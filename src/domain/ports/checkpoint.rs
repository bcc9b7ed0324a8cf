use async_trait::async_trait;

use crate::domain::{errors::DomainError, Conversation, ThreadId};

/// Durable per-thread snapshots. Saving replaces the whole stored log.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Conversation>, DomainError>;
    async fn save(&self, conversation: &Conversation) -> Result<(), DomainError>;
}
