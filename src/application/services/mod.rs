mod ingestion;
mod rag;

pub use ingestion::{IngestionReport, IngestionService};
pub use rag::RagService;
