use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use crate::domain::ThreadId;

/// One async lock per thread id. Chat turns hold it for the whole
/// load-run-save cycle so that turns on one thread never overlap, while
/// different threads proceed in parallel.
#[derive(Default)]
pub struct ThreadLocks {
    locks: Mutex<HashMap<ThreadId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn holds `thread_id`.
    pub async fn acquire(&self, thread_id: &ThreadId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(thread_id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Threads currently held or awaited.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CheckpointStore, ModelResponse};
    use crate::infrastructure::{AppConfig, ChatAgent, InMemoryCheckpointStore, ToolRegistry};
    use crate::testing::ScriptedModel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_thread_is_serialized() {
        let locks = Arc::new(ThreadLocks::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let (locks, running, peak) = (locks.clone(), running.clone(), peak.clone());
                tokio::spawn(async move {
                    let _guard = locks.acquire(&ThreadId::new("t1")).await;
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_other_threads_not_blocked() {
        let locks = ThreadLocks::new();
        let _held = locks.acquire(&ThreadId::new("t1")).await;

        let other = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&ThreadId::new("t2")),
        )
        .await;

        assert!(other.is_ok());
        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_turns_keep_every_message() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = Arc::new(ChatAgent::new(
            Arc::new(ScriptedModel::always(ModelResponse::text("FINAL ANSWER: ok"))),
            Arc::new(ToolRegistry::new(Vec::new()).unwrap()),
            store.clone(),
            &AppConfig::default(),
        ));
        let locks = Arc::new(ThreadLocks::new());

        let turns: Vec<_> = ["first", "second", "third"]
            .into_iter()
            .map(|query| {
                let (agent, locks) = (agent.clone(), locks.clone());
                tokio::spawn(async move {
                    let thread_id = ThreadId::new("t1");
                    let _guard = locks.acquire(&thread_id).await;
                    agent.run(&thread_id, query).await
                })
            })
            .collect();
        for turn in turns {
            turn.await.unwrap().unwrap();
        }

        let saved = store.load(&ThreadId::new("t1")).await.unwrap().unwrap();
        assert_eq!(saved.len(), 6);
    }
}
