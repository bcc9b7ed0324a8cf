use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, IndexEntry, RetrievalQuery, RetrievalResult,
};

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
}

impl RagService {
    pub fn new(embedding: Arc<dyn EmbeddingService>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedding,
            vector_store,
        }
    }

    /// Embeds the query and searches the index. Nothing is cached.
    #[instrument(skip(self, query), fields(result_count = query.result_count))]
    pub async fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult, DomainError> {
        if query.result_count == 0 {
            return Err(DomainError::validation("result count must be positive"));
        }

        let embedding = self
            .embedding
            .embed_query(&query.query)
            .await
            .map_err(|e| DomainError::retrieval(format!("embedding query: {e}")))?;

        let results = self
            .vector_store
            .search(&embedding, query.result_count)
            .await
            .map_err(|e| DomainError::retrieval(format!("searching index: {e}")))?;

        Ok(RetrievalResult::from_search(results))
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedding.embed_passages(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let expected = self.embedding.dimension();
        if let Some(bad) = embeddings.iter().find(|e| e.dimension() != expected) {
            return Err(DomainError::internal(format!(
                "embedding has {} dimensions, index expects {expected}",
                bad.dimension()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        self.vector_store.upsert(&entries).await
    }

    #[instrument(skip(self))]
    pub async fn clear_index(&self) -> Result<(), DomainError> {
        self.vector_store.clear().await
    }
}
