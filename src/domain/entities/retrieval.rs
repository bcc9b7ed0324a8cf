use serde::{Deserialize, Serialize};

use super::document::{ChunkMetadata, SearchResult};

pub const DEFAULT_RESULT_COUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub query: String,
    #[serde(default = "default_result_count")]
    pub result_count: usize,
}

fn default_result_count() -> usize {
    DEFAULT_RESULT_COUNT
}

impl RetrievalQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result_count: DEFAULT_RESULT_COUNT,
        }
    }

    pub fn with_result_count(mut self, result_count: usize) -> Self {
        self.result_count = result_count;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub passage: String,
    pub source_metadata: ChunkMetadata,
    pub relevance_score: f32,
}

impl From<SearchResult> for Passage {
    fn from(result: SearchResult) -> Self {
        Self {
            passage: result.chunk.content,
            source_metadata: result.chunk.metadata,
            relevance_score: result.score,
        }
    }
}

/// Passages ordered by descending relevance. Ties keep the store's order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalResult(pub Vec<Passage>);

impl RetrievalResult {
    pub fn from_search(mut results: Vec<SearchResult>) -> Self {
        // stable sort, so equal scores stay in store order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self(results.into_iter().map(Passage::from).collect())
    }

    pub fn passages(&self) -> &[Passage] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
