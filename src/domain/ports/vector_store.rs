use async_trait::async_trait;

use crate::domain::{errors::DomainError, Embedding, IndexEntry, SearchResult};

/// Similarity index over document chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts entries, replacing any with the same chunk id.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), DomainError>;

    /// At most `limit` results, best first. Equal scores keep insertion order.
    async fn search(&self, query: &Embedding, limit: usize)
        -> Result<Vec<SearchResult>, DomainError>;

    /// Drops every stored chunk.
    async fn clear(&self) -> Result<(), DomainError>;
}
