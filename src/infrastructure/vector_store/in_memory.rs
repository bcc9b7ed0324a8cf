use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{ports::VectorStore, DomainError, Embedding, IndexEntry, SearchResult};

/// Brute-force cosine search over entries held in insertion order. Used by
/// tests and local runs without Qdrant.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> DomainError {
    DomainError::internal(format!("vector store lock poisoned: {e}"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), DomainError> {
        let mut stored = self.entries.write().map_err(poisoned)?;

        for entry in entries {
            match stored.iter_mut().find(|e| e.chunk.id == entry.chunk.id) {
                Some(existing) => *existing = entry.clone(),
                None => stored.push(entry.clone()),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let stored = self.entries.read().map_err(poisoned)?;

        let mut results: Vec<SearchResult> = stored
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: query.cosine_similarity(&entry.embedding),
            })
            .collect();

        // stable: equal scores keep insertion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        Ok(results)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
