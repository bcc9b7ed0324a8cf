use std::collections::HashMap;

use super::{RetrievalArgs, RetrievalTool, ToolError};
use crate::domain::{ports::ToolSpec, DomainError};

/// Closed set of tools the agent can dispatch to.
pub enum RegisteredTool {
    Retrieval(RetrievalTool),
}

impl RegisteredTool {
    pub fn spec(&self) -> ToolSpec {
        match self {
            Self::Retrieval(tool) => tool.spec(),
        }
    }

    async fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<String, ToolError> {
        match self {
            Self::Retrieval(tool) => {
                let args: RetrievalArgs =
                    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
                        tool: name.to_string(),
                        reason: e.to_string(),
                    })?;
                tool.call(args).await
            }
        }
    }
}

/// Name to tool mapping, validated once at construction.
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new(tools: impl IntoIterator<Item = RegisteredTool>) -> Result<Self, DomainError> {
        let mut specs = Vec::new();
        let mut by_name = HashMap::new();

        for tool in tools {
            let spec = tool.spec();

            if spec.name.trim().is_empty() {
                return Err(DomainError::validation("tool name must not be empty"));
            }
            if !spec.parameters.is_object() {
                return Err(DomainError::validation(format!(
                    "argument schema of {} must be a JSON object",
                    spec.name
                )));
            }
            if by_name.contains_key(&spec.name) {
                return Err(DomainError::validation(format!(
                    "tool {} registered twice",
                    spec.name
                )));
            }

            by_name.insert(spec.name.clone(), tool);
            specs.push(spec);
        }

        Ok(Self {
            specs,
            tools: by_name,
        })
    }

    /// Specs in registration order.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(name, arguments).await
    }
}
