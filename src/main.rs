use rag_agent::api::{create_router, AppState};
use rag_agent::infrastructure::{create_pool, wiring, AppConfig};
use std::net::SocketAddr;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    rag_agent::init_tracing("api=debug,rag_agent=debug,tower_http=debug");

    let config = AppConfig::load()?;

    let redis_pool = create_pool(&config.config.redis_url)?;
    info!("Redis pool initialized");

    let checkpoints = wiring::checkpoint_store(redis_pool.clone(), &config);
    let mut state = AppState::new(redis_pool, config.clone()).with_checkpoints(checkpoints);

    match wiring::rag_service(&config).await {
        Ok(rag) => {
            info!("Vector store connected");
            state = state.with_rag_service(rag);
        }
        Err(e) => warn!(error = %e, "Vector store unavailable, /api/v1/search disabled"),
    }

    let app = create_router(state);

    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
