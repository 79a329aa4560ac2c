use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobQueue, RepositoryError};
use crate::domain::{CallRecordId, Job, JobId, JobStatus, JobType, TenantId};

const JOB_COLUMNS: &str = "id, tenant_id, call_record_id, job_type, status, priority, attempts, \
     max_attempts, scheduled_for, started_at, completed_at, error_message, result, created_at, \
     updated_at";

pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let status: String = row.try_get("status").map_err(query_failed)?;
    let job_type: String = row.try_get("job_type").map_err(query_failed)?;

    Ok(Job {
        id: JobId::from_uuid(row.try_get::<Uuid, _>("id").map_err(query_failed)?),
        tenant_id: TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id").map_err(query_failed)?),
        call_record_id: CallRecordId::from_uuid(
            row.try_get::<Uuid, _>("call_record_id")
                .map_err(query_failed)?,
        ),
        job_type: JobType::from_str(&job_type).map_err(RepositoryError::Mapping)?,
        status: JobStatus::from_str(&status).map_err(RepositoryError::Mapping)?,
        priority: row.try_get("priority").map_err(query_failed)?,
        attempts: row.try_get("attempts").map_err(query_failed)?,
        max_attempts: row.try_get("max_attempts").map_err(query_failed)?,
        scheduled_for: row.try_get("scheduled_for").map_err(query_failed)?,
        started_at: row.try_get("started_at").map_err(query_failed)?,
        completed_at: row.try_get("completed_at").map_err(query_failed)?,
        error_message: row.try_get("error_message").map_err(query_failed)?,
        result: row.try_get("result").map_err(query_failed)?,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        updated_at: row.try_get("updated_at").map_err(query_failed)?,
    })
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl JobQueue for PgJobQueue {
    #[instrument(skip(self, job), fields(job_id = %job.id.as_uuid()))]
    async fn enqueue(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, tenant_id, call_record_id, job_type, status, priority, attempts,
                 max_attempts, scheduled_for, started_at, completed_at, error_message,
                 result, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.tenant_id.as_uuid())
        .bind(job.call_record_id.as_uuid())
        .bind(job.job_type.as_str())
        .bind(job.status.as_str())
        .bind(job.priority)
        .bind(job.attempts)
        .bind(job.max_attempts)
        .bind(job.scheduled_for)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(&job.error_message)
        .bind(&job.result)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    /// A single UPDATE over a `FOR UPDATE SKIP LOCKED` subselect: the row
    /// lock makes concurrent claims hand out disjoint jobs without any
    /// read-then-update window.
    #[instrument(skip(self))]
    async fn claim_next(&self) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE jobs
            SET status = 'processing',
                started_at = now(),
                attempts = attempts + 1,
                updated_at = now()
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending' AND scheduled_for <= now()
                ORDER BY priority ASC, created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self, result), fields(job_id = %id.as_uuid()))]
    async fn complete(&self, id: JobId, result: serde_json::Value) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed',
                completed_at = now(),
                result = $1,
                updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(result)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self, error), fields(job_id = %id.as_uuid()))]
    async fn record_failure(&self, id: JobId, error: &str) -> Result<JobStatus, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE jobs
            SET status = CASE WHEN attempts >= max_attempts THEN 'failed' ELSE 'pending' END,
                completed_at = CASE WHEN attempts >= max_attempts THEN now() ELSE NULL END,
                error_message = $1,
                updated_at = now()
            WHERE id = $2
            RETURNING status
            "#,
        )
        .bind(error)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?
        .ok_or_else(|| RepositoryError::NotFound(format!("job {}", id.as_uuid())))?;

        let status: String = row.try_get("status").map_err(query_failed)?;
        JobStatus::from_str(&status).map_err(RepositoryError::Mapping)
    }

    #[instrument(skip(self))]
    async fn reset_stale(&self, older_than: Duration) -> Result<u64, RepositoryError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than)
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending',
                started_at = NULL,
                updated_at = now()
            WHERE status = 'processing' AND started_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(job_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM jobs WHERE status = $1 ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.iter().map(map_row).collect()
    }
}
