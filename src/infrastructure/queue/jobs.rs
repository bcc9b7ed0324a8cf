use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ThreadId;

/// Redis key of the status record for a job.
pub fn status_key(job_id: &Uuid) -> String {
    format!("jobs:status:{job_id}")
}

/// A unit of background work. Each job kind has its own Redis list.
pub trait QueuedJob: Serialize + DeserializeOwned + Send + Sync {
    const QUEUE: &'static str;

    fn job_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Status record kept under [`status_key`] until its TTL runs out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    fn at(job_id: Uuid, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            output: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn queued(job_id: Uuid) -> Self {
        Self::at(job_id, JobStatus::Queued)
    }

    pub fn running(job_id: Uuid) -> Self {
        Self::at(job_id, JobStatus::Running)
    }

    pub fn completed(job_id: Uuid, output: serde_json::Value) -> Self {
        Self {
            output: Some(output),
            ..Self::at(job_id, JobStatus::Completed)
        }
    }

    pub fn failed(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::at(job_id, JobStatus::Failed)
        }
    }
}

/// One agent turn on a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatJob {
    pub job_id: Uuid,
    pub thread_id: ThreadId,
    pub message: String,
}

impl ChatJob {
    pub fn new(thread_id: ThreadId, message: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            thread_id,
            message: message.into(),
        }
    }
}

impl QueuedJob for ChatJob {
    const QUEUE: &'static str = "jobs:chat";

    fn job_id(&self) -> Uuid {
        self.job_id
    }
}

/// Full refresh of the document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub job_id: Uuid,
}

impl IngestJob {
    pub fn new() -> Self {
        Self {
            job_id: Uuid::new_v4(),
        }
    }
}

impl Default for IngestJob {
    fn default() -> Self {
        Self::new()
    }
}

impl QueuedJob for IngestJob {
    const QUEUE: &'static str = "jobs:ingest";

    fn job_id(&self) -> Uuid {
        self.job_id
    }
}
