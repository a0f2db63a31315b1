use serde_json::Value;

/// Concurrency cap: at most this many jobs run at once.
pub const MAX_RUNNING_JOBS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "finished" => Some(JobStatus::Finished),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }
}

/// One outbound call made by a task body, kept for the job detail view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestRecord {
    pub timestamp_ms: u64,
    pub service: String,
    pub kind: String,
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResponseRecord {
    pub timestamp_ms: u64,
    pub service: String,
    pub raw: Option<Value>,
    pub error: Option<String>,
}

/// Read-only job view handed to subscribers. The task body lives on the
/// manager's internal record, never on this snapshot.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub created_at_ms: u64,
    pub prompts: Vec<String>,
    pub system_instructions: Option<String>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub requests: Vec<RequestRecord>,
    pub responses: Vec<ResponseRecord>,
}
