//! Retrieval-augmented question answering: a document ingestion job that
//! fills a vector index, and a tool-using chat agent with per-thread
//! checkpoints.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub(crate) mod testing;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
