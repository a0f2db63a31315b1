mod types;

pub use types::{Job, JobStatus, MAX_RUNNING_JOBS, RequestRecord, ResponseRecord};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::logbook::{LogKind, Logbook};
use crate::core::now_millis;

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send + 'static>>;

/// Caller-supplied work for a job. Shared so a Failed job can be re-run by
/// `retry` with its original submission parameters; dropped only when the
/// job leaves the list.
pub type TaskBody = Arc<dyn Fn(JobContext) -> TaskFuture + Send + Sync>;

/// Internal record: the public snapshot plus the task body. Keeping the
/// body on the record (instead of a side map keyed by id) makes an
/// orphaned-executor state unrepresentable.
struct JobEntry {
    job: Job,
    body: TaskBody,
}

/// Handle passed into a task body so it can append to the job's
/// request/response logs while it performs sub-steps.
#[derive(Clone)]
pub struct JobContext {
    manager: Arc<JobManager>,
    job_id: String,
    pub prompts: Vec<String>,
    pub system_instructions: Option<String>,
}

impl JobContext {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub async fn log_request(
        &self,
        service: &str,
        kind: &str,
        model: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) {
        let record = RequestRecord {
            timestamp_ms: now_millis(),
            service: service.to_string(),
            kind: kind.to_string(),
            model: model.to_string(),
            prompt: prompt.to_string(),
            system_instruction: system_instruction.map(str::to_string),
        };
        let mut entries = self.manager.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.job.id == self.job_id) {
            entry.job.requests.push(record);
        }
    }

    pub async fn log_response(&self, service: &str, raw: Option<Value>, error: Option<String>) {
        let record = ResponseRecord {
            timestamp_ms: now_millis(),
            service: service.to_string(),
            raw,
            error,
        };
        let mut entries = self.manager.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.job.id == self.job_id) {
            entry.job.responses.push(record);
        }
    }
}

/// Bounded concurrent scheduler: at most [`MAX_RUNNING_JOBS`] jobs run at a
/// time, admitted in list order. Lifecycle operations are no-ops outside
/// their legal source states.
pub struct JobManager {
    entries: Mutex<Vec<JobEntry>>,
    tx: broadcast::Sender<Vec<Job>>,
    logbook: Arc<Logbook>,
}

impl JobManager {
    pub fn new(logbook: Arc<Logbook>) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            entries: Mutex::new(Vec::new()),
            tx,
            logbook,
        }
    }

    /// Create a Pending job at the tail of the queue and return its id.
    pub async fn submit(
        &self,
        name: &str,
        prompts: Vec<String>,
        system_instructions: Option<String>,
        body: TaskBody,
    ) -> String {
        let job = Job {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            status: JobStatus::Pending,
            created_at_ms: now_millis(),
            prompts,
            system_instructions,
            result: None,
            error: None,
            requests: Vec::new(),
            responses: Vec::new(),
        };
        let id = job.id.clone();

        let mut entries = self.entries.lock().await;
        entries.push(JobEntry { job, body });
        info!(job = name, id = %id, "job added");
        self.logbook
            .record(LogKind::Info, &format!("Job added: {name}"), json!({"job_id": id}));
        self.notify(&entries);
        id
    }

    pub async fn jobs(&self) -> Vec<Job> {
        let entries = self.entries.lock().await;
        entries.iter().map(|e| e.job.clone()).collect()
    }

    pub async fn job(&self, id: &str) -> Option<Job> {
        let entries = self.entries.lock().await;
        entries.iter().find(|e| e.job.id == id).map(|e| e.job.clone())
    }

    /// Remove a Pending job. Running jobs cannot be interrupted mid-flight,
    /// so anything else is a no-op.
    pub async fn cancel(&self, id: &str) {
        let mut entries = self.entries.lock().await;
        let Some(index) = entries.iter().position(|e| e.job.id == id) else {
            return;
        };
        if entries[index].job.status != JobStatus::Pending {
            return;
        }
        let entry = entries.remove(index);
        self.logbook.record(
            LogKind::Info,
            &format!("Job cancelled: {}", entry.job.name),
            Value::Null,
        );
        self.notify(&entries);
    }

    /// Remove a Finished or Failed job.
    pub async fn delete(&self, id: &str) {
        let mut entries = self.entries.lock().await;
        let Some(index) = entries.iter().position(|e| e.job.id == id) else {
            return;
        };
        if !entries[index].job.status.is_terminal() {
            return;
        }
        entries.remove(index);
        self.notify(&entries);
    }

    /// Failed -> Pending with a fresh timestamp. The retained task body is
    /// re-run on the next admission with the original submission parameters.
    pub async fn retry(&self, id: &str) {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.iter_mut().find(|e| e.job.id == id) else {
            return;
        };
        if entry.job.status != JobStatus::Failed {
            return;
        }
        entry.job.status = JobStatus::Pending;
        entry.job.error = None;
        entry.job.result = None;
        entry.job.created_at_ms = now_millis();
        let name = entry.job.name.clone();
        self.logbook
            .record(LogKind::Info, &format!("Job retried: {name}"), Value::Null);
        self.notify(&entries);
    }

    /// Move a Pending job to the front of the Pending sub-sequence. The
    /// relative order of Running/Finished/Failed jobs is untouched.
    pub async fn prioritize(&self, id: &str) {
        let mut entries = self.entries.lock().await;
        let Some(index) = entries.iter().position(|e| e.job.id == id) else {
            return;
        };
        if index == 0 || entries[index].job.status != JobStatus::Pending {
            return;
        }
        let entry = entries.remove(index);
        let insert_at = entries
            .iter()
            .position(|e| e.job.status == JobStatus::Pending)
            .unwrap_or(entries.len());
        entries.insert(insert_at, entry);
        self.notify(&entries);
    }

    /// Current snapshot plus a live receiver for every subsequent change.
    pub async fn subscribe(&self) -> (Vec<Job>, broadcast::Receiver<Vec<Job>>) {
        let rx = self.tx.subscribe();
        (self.jobs().await, rx)
    }

    /// Admit Pending jobs (earliest first) while fewer than the cap are
    /// Running. Execution is spawned so admission never blocks on a task.
    pub async fn process_queue(self: &Arc<Self>) {
        let admitted: Vec<String> = {
            let mut entries = self.entries.lock().await;
            let mut running = entries
                .iter()
                .filter(|e| e.job.status == JobStatus::Running)
                .count();
            let mut ids = Vec::new();
            for entry in entries.iter_mut() {
                if running >= MAX_RUNNING_JOBS {
                    break;
                }
                if entry.job.status == JobStatus::Pending {
                    entry.job.status = JobStatus::Running;
                    running += 1;
                    ids.push(entry.job.id.clone());
                }
            }
            if !ids.is_empty() {
                self.notify(&entries);
            }
            ids
        };
        for id in admitted {
            let manager = Arc::clone(self);
            tokio::spawn(async move { manager.execute(id).await });
        }
    }

    /// Drive the queue on a one-second tick until the handle is aborted.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            loop {
                tick.tick().await;
                manager.process_queue().await;
            }
        })
    }

    async fn execute(self: Arc<Self>, id: String) {
        let (body, ctx, name) = {
            let entries = self.entries.lock().await;
            match entries.iter().find(|e| e.job.id == id) {
                Some(entry) => (
                    entry.body.clone(),
                    JobContext {
                        manager: Arc::clone(&self),
                        job_id: id.clone(),
                        prompts: entry.job.prompts.clone(),
                        system_instructions: entry.job.system_instructions.clone(),
                    },
                    entry.job.name.clone(),
                ),
                None => {
                    warn!(job_id = %id, "admitted job vanished before execution");
                    return;
                }
            }
        };

        self.logbook.record(
            LogKind::Info,
            &format!("Starting execution of {name}"),
            json!({"job_id": id}),
        );

        // Task-body failures stop here; the tick loop never sees them.
        let outcome = (body)(ctx).await;

        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.job.id == id) {
            match outcome {
                Ok(result) => {
                    entry.job.result = Some(result);
                    entry.job.status = JobStatus::Finished;
                    self.logbook
                        .record(LogKind::Info, &format!("Job finished: {name}"), Value::Null);
                }
                Err(e) => {
                    entry.job.error = Some(e.to_string());
                    entry.job.status = JobStatus::Failed;
                    self.logbook.record(
                        LogKind::Error,
                        &format!("Job failed: {name}"),
                        json!({"error": e.to_string()}),
                    );
                }
            }
            self.notify(&entries);
        }
    }

    fn notify(&self, entries: &[JobEntry]) {
        let snapshot: Vec<Job> = entries.iter().map(|e| e.job.clone()).collect();
        let _ = self.tx.send(snapshot);
    }
}

#[cfg(test)]
mod tests;
