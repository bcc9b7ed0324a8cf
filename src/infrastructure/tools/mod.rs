mod registry;
mod retrieval;

pub use registry::{RegisteredTool, ToolRegistry};
pub use retrieval::{RetrievalArgs, RetrievalTool};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Retrieval failed: {0}")]
    Retrieval(String),
}

impl ToolError {
    /// JSON payload handed back to the model in place of a tool result.
    pub fn to_payload(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}
