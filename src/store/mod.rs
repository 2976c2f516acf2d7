use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::question::Question;
use crate::models::response::{ResponseFilter, ResponseRecord};

pub mod memory;
pub mod postgres;

/// The durable collaborator behind the engine: append-only response writes,
/// filtered scans, and the one-shot question-set read at session start.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Appends one response record.
    async fn append_response(&self, record: &ResponseRecord) -> Result<()>;

    /// Returns every record matching the filter, ordered by timestamp.
    async fn scan_responses(&self, filter: &ResponseFilter) -> Result<Vec<ResponseRecord>>;

    /// Reads a question set in display order, or `None` if the set is unknown.
    async fn get_question_set(&self, set_id: &str) -> Result<Option<Vec<Question>>>;
}

/// Bounds a store call. An elapsed deadline degrades to `StoreUnavailable`
/// so the in-memory path is never blocked on the store.
pub async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StoreUnavailable(format!(
            "store call timed out after {limit:?}"
        ))),
    }
}
