mod conversation;
mod document;
mod embedding;
mod retrieval;

pub use conversation::{Conversation, Message, ThreadId, ToolInvocation};
pub use document::{
    split_into_chunks, ChunkMetadata, ContentType, DocumentChunk, DocumentContent, DocumentRef,
    SearchResult,
};
pub use embedding::{Embedding, IndexEntry};
pub use retrieval::{Passage, RetrievalQuery, RetrievalResult, DEFAULT_RESULT_COUNT};
