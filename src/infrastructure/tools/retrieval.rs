use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::ToolError;
use crate::application::RagService;
use crate::domain::{ports::ToolSpec, RetrievalQuery};
use crate::infrastructure::config::{RetrievalConfig, RetrievalToolConfig};

#[derive(Debug, Deserialize)]
pub struct RetrievalArgs {
    pub query: String,
    #[serde(default)]
    pub result_count: Option<i64>,
}

/// Exposes passage search over the document index to the model.
pub struct RetrievalTool {
    rag: Arc<RagService>,
    limits: RetrievalConfig,
    config: RetrievalToolConfig,
}

impl RetrievalTool {
    pub fn new(rag: Arc<RagService>, limits: &RetrievalConfig, config: RetrievalToolConfig) -> Self {
        Self {
            rag,
            limits: limits.clone(),
            config,
        }
    }

    pub fn with_defaults(rag: Arc<RagService>) -> Self {
        Self::new(rag, &RetrievalConfig::default(), RetrievalToolConfig::default())
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "result_count": {
                        "type": "integer",
                        "description": format!(
                            "Number of passages to return (default {}, max {})",
                            self.limits.default_result_count, self.limits.max_result_count
                        ),
                        "minimum": 1
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub fn resolve_count(&self, requested: Option<i64>) -> usize {
        self.limits.resolve_count(requested)
    }

    pub async fn search(&self, query: &str, result_count: Option<i64>) -> Result<String, ToolError> {
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: self.config.name.clone(),
                reason: "query must not be empty".into(),
            });
        }

        let count = self.resolve_count(result_count);
        debug!(requested = ?result_count, count, "retrieval tool search");

        let result = self
            .rag
            .retrieve(&RetrievalQuery::new(query).with_result_count(count))
            .await
            .map_err(|e| ToolError::Retrieval(e.to_string()))?;

        let payload = if result.is_empty() {
            json!({ "passages": [], "message": self.config.no_results_message })
        } else {
            json!({ "passages": result })
        };

        Ok(payload.to_string())
    }

    pub async fn call(&self, args: RetrievalArgs) -> Result<String, ToolError> {
        self.search(&args.query, args.result_count).await
    }
}
