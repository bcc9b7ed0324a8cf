use async_trait::async_trait;

use crate::domain::{errors::DomainError, Embedding};

/// Text to vector conversion. Queries and indexed passages go through the
/// same model so their vectors are comparable.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_query(&self, query: &str) -> Result<Embedding, DomainError>;

    /// One vector per passage, in input order.
    async fn embed_passages(&self, passages: &[String]) -> Result<Vec<Embedding>, DomainError>;

    fn dimension(&self) -> usize;
}
