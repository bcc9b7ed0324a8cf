use async_trait::async_trait;

use crate::domain::{errors::DomainError, DocumentContent, DocumentRef};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DomainError>;
    async fn fetch_content(&self, doc: &DocumentRef) -> Result<DocumentContent, DomainError>;
}
