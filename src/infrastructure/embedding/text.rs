use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;
use tracing::instrument;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// Embeddings from any rig embedding model; OpenAI in production.
pub struct TextEmbedding<M = openai::EmbeddingModel> {
    model: M,
    name: String,
}

impl TextEmbedding {
    /// Reads `OPENAI_API_KEY` once, when the client is built. The configured
    /// dimension is requested from the model.
    pub fn openai(config: &EmbeddingConfig) -> Self {
        let client = openai::Client::from_env();
        Self::new(
            client.embedding_model_with_ndims(&config.model, config.dimension),
            config.model.clone(),
        )
    }
}

impl<M: EmbeddingModel> TextEmbedding<M> {
    pub fn new(model: M, name: impl Into<String>) -> Self {
        Self {
            model,
            name: name.into(),
        }
    }

    /// One vector per text, in input order. Requests are split at the
    /// model's batch limit.
    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
            let embedded = self
                .model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|e| DomainError::retrieval(format!("embedding request: {e}")))?;

            if embedded.len() != batch.len() {
                return Err(DomainError::retrieval(format!(
                    "embedding model returned {} vectors for {} inputs",
                    embedded.len(),
                    batch.len()
                )));
            }

            out.extend(
                embedded
                    .into_iter()
                    .map(|e| Embedding::new(e.vec.into_iter().map(|x| x as f32).collect())),
            );
        }

        Ok(out)
    }
}

#[async_trait]
impl<M: EmbeddingModel + 'static> EmbeddingService for TextEmbedding<M> {
    #[instrument(skip_all, fields(model = %self.name))]
    async fn embed_query(&self, query: &str) -> Result<Embedding, DomainError> {
        self.embed_all(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| DomainError::retrieval("embedding model returned no vector"))
    }

    #[instrument(skip_all, fields(model = %self.name, count = passages.len()))]
    async fn embed_passages(&self, passages: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_all(passages).await
    }

    fn dimension(&self) -> usize {
        self.model.ndims()
    }
}
