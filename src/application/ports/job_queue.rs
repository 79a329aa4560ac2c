use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Job, JobId, JobStatus};

use super::RepositoryError;

/// Persisted, priority-ordered work queue.
///
/// State machine per job: `pending → processing → completed | failed`,
/// with `failed` re-armed to `pending` while attempts remain. Jobs are
/// never deleted; terminal rows keep their error message.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &Job) -> Result<(), RepositoryError>;

    /// Atomically claim the next eligible pending job: `scheduled_for`
    /// due, lowest priority value first, oldest first within a priority.
    /// The claim transitions the row to `processing`, stamps
    /// `started_at`, and increments `attempts`. Implementations must
    /// guarantee that concurrent callers never receive the same job.
    async fn claim_next(&self) -> Result<Option<Job>, RepositoryError>;

    async fn complete(&self, id: JobId, result: serde_json::Value) -> Result<(), RepositoryError>;

    /// Record a failed attempt. Returns the resulting status: `pending`
    /// when the job was re-armed for retry, `failed` when the attempt
    /// budget is exhausted. The error message is retained either way.
    async fn record_failure(&self, id: JobId, error: &str) -> Result<JobStatus, RepositoryError>;

    /// Reset jobs stuck in `processing` longer than `older_than` back to
    /// `pending`. Returns the number of jobs reset. Idempotent: a second
    /// sweep without new staleness resets nothing.
    async fn reset_stale(&self, older_than: Duration) -> Result<u64, RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;
}
