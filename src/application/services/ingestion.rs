use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::application::RagService;
use crate::domain::{
    ports::{DocumentSource, TextExtractor},
    split_into_chunks, ChunkMetadata, DocumentChunk, DomainError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub documents_seen: usize,
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub chunks_indexed: usize,
}

/// Full-refresh batch job: clears the index, then re-derives every chunk from
/// the document source. Any failure aborts the run and may leave the index
/// empty or partially populated.
pub struct IngestionService {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn TextExtractor>,
    rag: Arc<RagService>,
    window_size: usize,
    overlap: usize,
}

impl IngestionService {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn TextExtractor>,
        rag: Arc<RagService>,
    ) -> Self {
        Self {
            source,
            extractor,
            rag,
            window_size: 1000,
            overlap: 200,
        }
    }

    pub fn with_chunking(mut self, window_size: usize, overlap: usize) -> Self {
        self.window_size = window_size;
        self.overlap = overlap;
        self
    }

    #[instrument(skip(self), fields(window_size = self.window_size, overlap = self.overlap))]
    pub async fn run_full_refresh(&self) -> Result<IngestionReport, DomainError> {
        let documents = self.source.list_documents().await?;
        info!(count = documents.len(), "listed source documents");

        self.rag.clear_index().await?;

        let mut report = IngestionReport {
            documents_seen: documents.len(),
            ..Default::default()
        };

        for doc in &documents {
            let content = self.source.fetch_content(doc).await?;
            let text = self.extractor.extract(&content)?;

            if text.trim().is_empty() {
                warn!(document = %doc.name, "no text extracted, skipping");
                report.documents_skipped += 1;
                continue;
            }

            let metadata = ChunkMetadata::from_ref(doc);
            let pieces = split_into_chunks(&text, self.window_size, self.overlap)?;
            let chunks: Vec<DocumentChunk> = pieces
                .into_iter()
                .enumerate()
                .map(|(i, content)| DocumentChunk::new(content, i).with_metadata(metadata.clone()))
                .collect();

            self.rag.index_chunks(&chunks).await?;

            info!(document = %doc.name, chunks = chunks.len(), "document indexed");
            report.documents_indexed += 1;
            report.chunks_indexed += chunks.len();
        }

        info!(?report, "ingestion finished");
        Ok(report)
    }
}
