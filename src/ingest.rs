//! One-shot full refresh of the document index.

use rag_agent::infrastructure::{wiring, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    rag_agent::init_tracing("ingest=info,rag_agent=info");

    let config = AppConfig::load()?;
    let rag = wiring::rag_service(&config).await?;
    let ingestion = wiring::ingestion_service(&config, rag)?;

    let report = ingestion.run_full_refresh().await?;

    info!(
        documents_seen = report.documents_seen,
        documents_indexed = report.documents_indexed,
        documents_skipped = report.documents_skipped,
        chunks_indexed = report.chunks_indexed,
        "ingestion finished"
    );

    Ok(())
}
