mod chat_model;
mod checkpoint;
mod document_source;
mod embedding;
mod extractor;
mod vector_store;

pub use chat_model::{ChatModel, ModelRequest, ModelResponse, ToolSpec};
pub use checkpoint::CheckpointStore;
pub use document_source::DocumentSource;
pub use embedding::EmbeddingService;
pub use extractor::TextExtractor;
pub use vector_store::VectorStore;
