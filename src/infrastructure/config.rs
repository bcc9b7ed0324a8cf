use serde::Deserialize;
use std::path::Path;

use crate::domain::DomainError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads `config.yaml` and `prompts.yaml` from `CONFIG_DIR` (default
    /// `config`), then applies environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        let mut app = Self::load_from(Path::new(&dir))?;
        app.config.apply_env();
        Ok(app)
    }

    pub fn load_from(dir: &Path) -> Result<Self, DomainError> {
        Ok(Self {
            config: read_yaml(&dir.join("config.yaml"))?.unwrap_or_default(),
            prompts: read_yaml(&dir.join("prompts.yaml"))?.unwrap_or_default(),
        })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, DomainError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file missing, using defaults");
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| DomainError::internal(format!("reading {}: {e}", path.display())))?;
    serde_yaml::from_str(&raw)
        .map(Some)
        .map_err(|e| DomainError::validation(format!("parsing {}: {e}", path.display())))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub agent: AgentConfig,
    pub retrieval: RetrievalConfig,
    pub ingestion: IngestionConfig,
    pub vector_store: VectorStoreConfig,
    pub checkpoint: CheckpointConfig,
    pub source: SourceConfig,
    pub redis_url: String,
    pub server: ServerConfig,
    pub worker: WorkerConfig,
    pub cors: CorsConfig,
}

impl Config {
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.redis_url = url;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(n) = std::env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|n| n.parse().ok())
        {
            self.worker.concurrency = n;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            agent: AgentConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingestion: IngestionConfig::default(),
            vector_store: VectorStoreConfig::default(),
            checkpoint: CheckpointConfig::default(),
            source: SourceConfig::default(),
            redis_url: "redis://localhost:6379".into(),
            server: ServerConfig::default(),
            worker: WorkerConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.0-flash".into(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".into(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_result_count: usize,
    pub max_result_count: usize,
}

impl RetrievalConfig {
    /// Missing or non-positive counts fall back to the default; large ones are
    /// capped at the maximum.
    pub fn resolve_count(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(n) if n > 0 => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.max_result_count.max(1)),
            _ => self.default_result_count.max(1),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_result_count: 10,
            max_result_count: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub window_size: usize,
    pub overlap: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            window_size: 1000,
            overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub url: String,
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".into(),
            collection: "knowledge_base".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    pub key_prefix: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            key_prefix: "checkpoint".into(),
        }
    }
}

/// Microsoft Graph document library. The client secret is read from
/// `GRAPH_CLIENT_SECRET` only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub site_id: String,
    pub drive_id: String,
    pub graph_url: String,
    pub login_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            site_id: String::new(),
            drive_id: String::new(),
            graph_url: "https://graph.microsoft.com/v1.0".into(),
            login_url: "https://login.microsoftonline.com".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub result_ttl_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            result_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub agent: AgentPrompts,
    pub tools: ToolPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// `{tools}` is replaced with the registered tool names.
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant that answers questions about the company's \
                     documents. Available tools: {tools}. Search the knowledge base whenever \
                     the question needs facts from the documents. Start your final answer \
                     with \"FINAL ANSWER:\"."
                .into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolPrompts {
    pub retrieval: RetrievalToolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalToolConfig {
    pub name: String,
    pub description: String,
    pub no_results_message: String,
}

impl Default for RetrievalToolConfig {
    fn default() -> Self {
        Self {
            name: "search_documents".into(),
            description: "Search the document library for passages relevant to a query.".into(),
            no_results_message: "No relevant documents found.".into(),
        }
    }
}
