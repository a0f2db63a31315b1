pub mod architect;
pub mod jobs;
pub mod llm;
pub mod logbook;
pub mod persist;
pub mod tree;
pub mod workspace;

/// Unix milliseconds. The clock going backwards degrades to 0 rather than
/// panicking inside a service method.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
