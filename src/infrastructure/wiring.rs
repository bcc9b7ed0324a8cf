//! Construction of the production component graph from configuration.

use std::sync::Arc;

use crate::application::{IngestionService, RagService};
use crate::domain::{ports::EmbeddingService, DomainError};
use crate::infrastructure::{
    chat_model_from_config, AppConfig, ChatAgent, DocumentExtractor, GraphDocumentSource,
    QdrantVectorStore, RedisCheckpointStore, RedisPool, RegisteredTool, RetrievalTool,
    TextEmbedding, ToolRegistry,
};

pub async fn rag_service(app: &AppConfig) -> Result<Arc<RagService>, DomainError> {
    let config = &app.config;
    let embedding = Arc::new(TextEmbedding::openai(&config.embedding));
    let vector_store = Arc::new(
        QdrantVectorStore::new(
            &config.vector_store.url,
            &config.vector_store.collection,
            embedding.dimension(),
        )
        .await?,
    );
    Ok(Arc::new(RagService::new(embedding, vector_store)))
}

pub fn tool_registry(rag: Arc<RagService>, app: &AppConfig) -> Result<ToolRegistry, DomainError> {
    ToolRegistry::new([RegisteredTool::Retrieval(RetrievalTool::new(
        rag,
        &app.config.retrieval,
        app.prompts.tools.retrieval.clone(),
    ))])
}

pub fn checkpoint_store(pool: RedisPool, app: &AppConfig) -> Arc<RedisCheckpointStore> {
    Arc::new(RedisCheckpointStore::new(
        pool,
        app.config.checkpoint.key_prefix.clone(),
    ))
}

pub fn chat_agent(
    app: &AppConfig,
    rag: Arc<RagService>,
    pool: RedisPool,
) -> Result<ChatAgent, DomainError> {
    let model = chat_model_from_config(&app.config.llm)?;
    let tools = Arc::new(tool_registry(rag, app)?);
    Ok(ChatAgent::new(model, tools, checkpoint_store(pool, app), app))
}

pub fn ingestion_service(
    app: &AppConfig,
    rag: Arc<RagService>,
) -> Result<IngestionService, DomainError> {
    let source = Arc::new(GraphDocumentSource::from_env(app.config.source.clone())?);
    Ok(IngestionService::new(source, Arc::new(DocumentExtractor), rag)
        .with_chunking(app.config.ingestion.window_size, app.config.ingestion.overlap))
}
