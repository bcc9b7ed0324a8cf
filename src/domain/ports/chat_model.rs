use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, Message, ToolInvocation};

/// Declaration of a callable tool as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub system: String,
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
        }
    }

    pub fn into_message(self) -> Message {
        Message::ai(self.content, self.tool_calls)
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, DomainError>;
}
