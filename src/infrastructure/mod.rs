pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod llm;
pub mod queue;
pub mod source;
pub mod tools;
pub mod vector_store;
pub mod wiring;

pub use agent::ChatAgent;
pub use checkpoint::{InMemoryCheckpointStore, RedisCheckpointStore};
pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::TextEmbedding;
pub use extract::DocumentExtractor;
pub use llm::{chat_model_from_config, RigChatModel};
pub use queue::{
    create_pool, status_key, ChatJob, IngestJob, JobRecord, JobStatus, QueuedJob, RedisPool,
    ThreadLocks,
};
pub use source::GraphDocumentSource;
pub use tools::{RegisteredTool, RetrievalTool, ToolError, ToolRegistry};
pub use vector_store::{InMemoryVectorStore, QdrantVectorStore};
