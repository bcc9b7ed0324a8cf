use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{ports::CheckpointStore, Conversation, DomainError, ThreadId};

pub struct InMemoryCheckpointStore {
    threads: RwLock<HashMap<ThreadId, Conversation>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, thread_id: &ThreadId) -> Result<Option<Conversation>, DomainError> {
        let threads = self
            .threads
            .read()
            .map_err(|e| DomainError::checkpoint(e.to_string()))?;
        Ok(threads.get(thread_id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), DomainError> {
        let mut threads = self
            .threads
            .write()
            .map_err(|e| DomainError::checkpoint(e.to_string()))?;
        threads.insert(conversation.thread_id().clone(), conversation.clone());
        Ok(())
    }
}
