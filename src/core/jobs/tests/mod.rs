
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;

use crate::core::jobs::{JobManager, JobStatus, TaskBody};
use crate::core::logbook::Logbook;

fn manager() -> Arc<JobManager> {
    Arc::new(JobManager::new(Arc::new(Logbook::new())))
}

fn instant_body(result: Value) -> TaskBody {
    Arc::new(move |_ctx| {
        let result = result.clone();
        Box::pin(async move { Ok(result) })
    })
}

fn failing_body(message: &'static str) -> TaskBody {
    Arc::new(move |_ctx| Box::pin(async move { Err(anyhow::anyhow!(message)) }))
}

/// Body that parks until the gate is notified, keeping its job Running.
fn hanging_body(gate: Arc<Notify>) -> TaskBody {
    Arc::new(move |_ctx| {
        let gate = gate.clone();
        Box::pin(async move {
            gate.notified().await;
            Ok(Value::Null)
        })
    })
}

async fn wait_for_status(manager: &Arc<JobManager>, id: &str, status: JobStatus) {
    for _ in 0..200 {
        if manager.job(id).await.map(|j| j.status) == Some(status) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached {status:?}");
}
