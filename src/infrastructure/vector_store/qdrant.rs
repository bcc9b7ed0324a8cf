use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeleteCollectionBuilder, Distance, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::domain::{
    ports::VectorStore, ChunkMetadata, DocumentChunk, DomainError, Embedding, IndexEntry,
    SearchResult,
};

/// Qdrant collection with cosine distance. Point ids are the chunk UUIDs and
/// the chunk itself travels in the payload.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

fn qdrant_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::retrieval(format!("qdrant: {e}"))
}

impl QdrantVectorStore {
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url).build().map_err(qdrant_err)?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };
        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        if self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(qdrant_err)?
        {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(qdrant_err)?;
        info!(collection = %self.collection, dimension = self.dimension, "created collection");

        Ok(())
    }

    fn point(entry: &IndexEntry) -> Result<PointStruct, DomainError> {
        let chunk = &entry.chunk;
        let payload = Payload::try_from(serde_json::json!({
            "chunk_id": chunk.id.to_string(),
            "content": chunk.content,
            "chunk_index": chunk.chunk_index,
            "source": chunk.metadata.source,
            "document_name": chunk.metadata.document_name,
        }))
        .map_err(|e| DomainError::internal(format!("chunk payload: {e}")))?;

        Ok(PointStruct::new(
            chunk.id.to_string(),
            entry.embedding.values().to_vec(),
            payload,
        ))
    }

    fn chunk_from_payload(payload: &HashMap<String, Value>) -> Option<DocumentChunk> {
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());

        Some(DocumentChunk {
            id: text("chunk_id")?.parse().ok()?,
            content: text("content")?,
            chunk_index: usize::try_from(payload.get("chunk_index")?.as_integer()?).ok()?,
            metadata: ChunkMetadata {
                source: text("source"),
                document_name: text("document_name"),
            },
        })
    }

    fn search_result(point: ScoredPoint) -> Option<SearchResult> {
        match Self::chunk_from_payload(&point.payload) {
            Some(chunk) => Some(SearchResult {
                chunk,
                score: point.score,
            }),
            None => {
                warn!(point = ?point.id, "skipping point with malformed payload");
                None
            }
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    #[instrument(skip_all, fields(collection = %self.collection, count = entries.len()))]
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let points = entries
            .iter()
            .map(Self::point)
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(qdrant_err)?;

        Ok(())
    }

    #[instrument(skip(self, query), fields(collection = %self.collection))]
    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.values().to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(qdrant_err)?;

        Ok(response
            .result
            .into_iter()
            .filter_map(Self::search_result)
            .collect())
    }

    /// Drops and recreates the collection.
    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn clear(&self) -> Result<(), DomainError> {
        self.client
            .delete_collection(DeleteCollectionBuilder::new(&self.collection))
            .await
            .map_err(qdrant_err)?;

        self.ensure_collection().await
    }
}
