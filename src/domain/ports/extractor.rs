use crate::domain::{errors::DomainError, DocumentContent};

/// Turns downloaded bytes into plain text, dispatching on the content type.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, content: &DocumentContent) -> Result<String, DomainError>;
}
