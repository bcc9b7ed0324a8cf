use deadpool_redis::{redis::AsyncCommands, Connection};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use rag_agent::application::IngestionService;
use rag_agent::infrastructure::{
    create_pool, status_key, wiring, AppConfig, ChatAgent, ChatJob, IngestJob, JobRecord,
    QueuedJob, RedisPool, ThreadLocks,
};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Worker shut down: {0}")]
    Shutdown(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

pub struct WorkerState {
    pub redis_pool: RedisPool,
    pub agent: ChatAgent,
    pub thread_locks: ThreadLocks,
    pub ingestion: IngestionService,
    pub result_ttl: u64,
}

impl WorkerState {
    pub async fn new(redis_pool: RedisPool, config: &AppConfig) -> anyhow::Result<Self> {
        let rag = wiring::rag_service(config).await?;
        let agent = wiring::chat_agent(config, rag.clone(), redis_pool.clone())?;
        let ingestion = wiring::ingestion_service(config, rag)?;

        Ok(Self {
            redis_pool,
            agent,
            thread_locks: ThreadLocks::new(),
            ingestion,
            result_ttl: config.config.worker.result_ttl_seconds,
        })
    }
}

pub struct JobConsumer {
    state: Arc<WorkerState>,
    concurrency: usize,
}

impl JobConsumer {
    pub fn new(state: WorkerState, concurrency: usize) -> Self {
        Self {
            state: Arc::new(state),
            concurrency: concurrency.max(1),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        info!(concurrency = self.concurrency, "consumer started");

        loop {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::Shutdown(e.to_string()))?;
            let state = self.state.clone();

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = process_next_job(&state).await {
                    tracing::error!(error = %e, "job failed");
                }
            });

            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }
}

async fn conn(state: &WorkerState) -> Result<Connection> {
    state
        .redis_pool
        .get()
        .await
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

async fn set_status(state: &WorkerState, status: &JobRecord) -> Result<()> {
    let json = serde_json::to_string(status)?;
    conn(state)
        .await?
        .set_ex::<_, _, ()>(status_key(&status.job_id), &json, state.result_ttl)
        .await
        .map_err(|e| WorkerError::Redis(e.to_string()))
}

async fn process_next_job(state: &WorkerState) -> Result<()> {
    let result: Option<(String, String)> = conn(state)
        .await?
        .brpop(&[ChatJob::QUEUE, IngestJob::QUEUE], 1.0)
        .await
        .map_err(|e| WorkerError::Redis(e.to_string()))?;

    if let Some((queue, job_json)) = result {
        match queue.as_str() {
            q if q == ChatJob::QUEUE => {
                process_chat_job(state, serde_json::from_str(&job_json)?).await?;
            }
            q if q == IngestJob::QUEUE => {
                process_ingest_job(state, serde_json::from_str(&job_json)?).await?;
            }
            _ => tracing::warn!(queue, "unknown queue"),
        }
    }
    Ok(())
}

async fn process_chat_job(state: &WorkerState, job: ChatJob) -> Result<()> {
    info!(job_id = %job.job_id, thread_id = %job.thread_id, "processing chat");
    // earlier turns on this thread must be saved before this one loads
    let _turn = state.thread_locks.acquire(&job.thread_id).await;
    set_status(state, &JobRecord::running(job.job_id)).await?;

    let status = match state.agent.run(&job.thread_id, &job.message).await {
        Ok(answer) => JobRecord::completed(
            job.job_id,
            serde_json::json!({
                "response": answer,
                "thread_id": job.thread_id,
            }),
        ),
        Err(e) => JobRecord::failed(job.job_id, e.to_string()),
    };
    set_status(state, &status).await?;

    info!(job_id = %job.job_id, status = status.status.as_str(), "chat finished");
    Ok(())
}

async fn process_ingest_job(state: &WorkerState, job: IngestJob) -> Result<()> {
    info!(job_id = %job.job_id, "processing ingest");
    set_status(state, &JobRecord::running(job.job_id)).await?;

    let status = match state.ingestion.run_full_refresh().await {
        Ok(report) => JobRecord::completed(job.job_id, serde_json::to_value(&report)?),
        Err(e) => JobRecord::failed(job.job_id, e.to_string()),
    };
    set_status(state, &status).await?;

    info!(job_id = %job.job_id, status = status.status.as_str(), "ingest finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    rag_agent::init_tracing("worker=debug,rag_agent=debug");

    let config = AppConfig::load()?;

    let redis_pool = create_pool(&config.config.redis_url)?;
    info!("Redis pool initialized");

    let state = WorkerState::new(redis_pool, &config).await?;
    info!("Qdrant connected");

    let consumer = JobConsumer::new(state, config.config.worker.concurrency);
    consumer.start().await?;

    Ok(())
}
