use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("No final answer within {limit} tool iterations")]
    IterationLimitExceeded { limit: usize },

    #[error("Retrieval service error: {0}")]
    RetrievalService(String),

    #[error("Checkpoint store error: {0}")]
    CheckpointStore(String),

    #[error("Document source error: {0}")]
    DocumentSource(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn model(msg: impl Into<String>) -> Self {
        Self::ModelInvocation(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::RetrievalService(msg.into())
    }

    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::CheckpointStore(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::DocumentSource(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
