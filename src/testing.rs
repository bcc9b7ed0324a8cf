//! Port fakes shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::{
    ports::{ChatModel, DocumentSource, EmbeddingService, ModelRequest, ModelResponse},
    ContentType, DocumentContent, DocumentRef, DomainError, Embedding, Message,
};

/// Embeds text as keyword occurrence counts and records every query.
pub struct KeywordEmbedding {
    keywords: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl KeywordEmbedding {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let lower = text.to_lowercase();
        Embedding::new(
            self.keywords
                .iter()
                .map(|k| lower.matches(k.as_str()).count() as f32)
                .collect(),
        )
    }
}

#[async_trait]
impl EmbeddingService for KeywordEmbedding {
    async fn embed_query(&self, query: &str) -> Result<Embedding, DomainError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.vectorize(query))
    }

    async fn embed_passages(&self, passages: &[String]) -> Result<Vec<Embedding>, DomainError> {
        Ok(passages.iter().map(|p| self.vectorize(p)).collect())
    }

    fn dimension(&self) -> usize {
        self.keywords.len()
    }
}

/// Embedding service that always fails.
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingService for FailingEmbedding {
    async fn embed_query(&self, _query: &str) -> Result<Embedding, DomainError> {
        Err(DomainError::retrieval("embedding endpoint unavailable"))
    }

    async fn embed_passages(&self, _passages: &[String]) -> Result<Vec<Embedding>, DomainError> {
        Err(DomainError::retrieval("embedding endpoint unavailable"))
    }

    fn dimension(&self) -> usize {
        0
    }
}

/// Snapshot of one request seen by [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// Replays queued responses in order; errors once the script runs out.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, String>>>,
    seen: Mutex<Vec<SeenRequest>>,
    repeat: Option<ModelResponse>,
}

impl ScriptedModel {
    pub fn new(responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    /// Answers every request with the same response.
    pub fn always(response: ModelResponse) -> Self {
        Self {
            repeat: Some(response),
            ..Default::default()
        }
    }

    pub fn then_fail(self, error: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(error.into()));
        self
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, DomainError> {
        self.seen.lock().unwrap().push(SeenRequest {
            system: request.system.clone(),
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
        });

        if let Some(response) = &self.repeat {
            return Ok(response.clone());
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(DomainError::model(e)),
            None => Err(DomainError::model("script exhausted")),
        }
    }
}

/// In-process document library. `None` content makes the fetch fail.
#[derive(Default)]
pub struct StaticSource {
    documents: Vec<(DocumentRef, Option<DocumentContent>)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, content_type: ContentType, bytes: &[u8]) -> Self {
        let doc = Self::doc_ref(self.documents.len(), name);
        self.documents.push((
            doc,
            Some(DocumentContent {
                bytes: bytes.to_vec(),
                content_type,
            }),
        ));
        self
    }

    pub fn with_failing_document(mut self, name: &str) -> Self {
        let doc = Self::doc_ref(self.documents.len(), name);
        self.documents.push((doc, None));
        self
    }

    fn doc_ref(index: usize, name: &str) -> DocumentRef {
        DocumentRef {
            id: format!("doc-{index}"),
            name: name.to_string(),
            web_url: Some(format!("https://library.example/{name}")),
            mime_type: None,
        }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn list_documents(&self) -> Result<Vec<DocumentRef>, DomainError> {
        Ok(self.documents.iter().map(|(doc, _)| doc.clone()).collect())
    }

    async fn fetch_content(&self, doc: &DocumentRef) -> Result<DocumentContent, DomainError> {
        self.documents
            .iter()
            .find(|(d, _)| d.id == doc.id)
            .and_then(|(_, content)| content.clone())
            .ok_or_else(|| DomainError::source(format!("download failed for {}", doc.name)))
    }
}
