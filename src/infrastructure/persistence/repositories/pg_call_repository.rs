use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{CallRepository, RepositoryError};
use crate::domain::{
    CallDirection, CallDisposition, CallRecord, CallRecordId, ConnectionId, ProcessingStatus,
    StoragePath, TenantId,
};

const CALL_COLUMNS: &str = "id, tenant_id, connection_id, uniqueid, src, dst, direction, \
     disposition, started_at, answered_at, ended_at, duration_seconds, recording_filename, \
     recording_path, transcript_path, analysis_path, processing_status, processing_error, \
     created_at, updated_at";

pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(row: &PgRow) -> Result<CallRecord, RepositoryError> {
    let direction: String = row.try_get("direction").map_err(query_failed)?;
    let disposition: String = row.try_get("disposition").map_err(query_failed)?;
    let status: String = row.try_get("processing_status").map_err(query_failed)?;

    Ok(CallRecord {
        id: CallRecordId::from_uuid(row.try_get::<Uuid, _>("id").map_err(query_failed)?),
        tenant_id: TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id").map_err(query_failed)?),
        connection_id: ConnectionId::from_uuid(
            row.try_get::<Uuid, _>("connection_id").map_err(query_failed)?,
        ),
        uniqueid: row.try_get("uniqueid").map_err(query_failed)?,
        src: row.try_get("src").map_err(query_failed)?,
        dst: row.try_get("dst").map_err(query_failed)?,
        direction: CallDirection::from_str(&direction).map_err(RepositoryError::Mapping)?,
        disposition: CallDisposition::from_str(&disposition)
            .map_err(RepositoryError::Mapping)?,
        started_at: row.try_get("started_at").map_err(query_failed)?,
        answered_at: row.try_get("answered_at").map_err(query_failed)?,
        ended_at: row.try_get("ended_at").map_err(query_failed)?,
        duration_seconds: row.try_get("duration_seconds").map_err(query_failed)?,
        recording_filename: row.try_get("recording_filename").map_err(query_failed)?,
        recording_path: row.try_get("recording_path").map_err(query_failed)?,
        transcript_path: row.try_get("transcript_path").map_err(query_failed)?,
        analysis_path: row.try_get("analysis_path").map_err(query_failed)?,
        processing_status: ProcessingStatus::from_str(&status)
            .map_err(RepositoryError::Mapping)?,
        processing_error: row.try_get("processing_error").map_err(query_failed)?,
        created_at: row.try_get("created_at").map_err(query_failed)?,
        updated_at: row.try_get("updated_at").map_err(query_failed)?,
    })
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

#[async_trait]
impl CallRepository for PgCallRepository {
    #[instrument(skip(self, record), fields(call_record_id = %record.id.as_uuid()))]
    async fn create(&self, record: &CallRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO call_records
                (id, tenant_id, connection_id, uniqueid, src, dst, direction, disposition,
                 started_at, answered_at, ended_at, duration_seconds, recording_filename,
                 processing_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.tenant_id.as_uuid())
        .bind(record.connection_id.as_uuid())
        .bind(&record.uniqueid)
        .bind(&record.src)
        .bind(&record.dst)
        .bind(record.direction.as_str())
        .bind(record.disposition.as_str())
        .bind(record.started_at)
        .bind(record.answered_at)
        .bind(record.ended_at)
        .bind(record.duration_seconds)
        .bind(&record.recording_filename)
        .bind(record.processing_status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                RepositoryError::ConstraintViolation(e.to_string())
            } else {
                query_failed(e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(call_record_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: CallRecordId) -> Result<Option<CallRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM call_records WHERE id = $1",
            CALL_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id.as_uuid(), uniqueid))]
    async fn find_by_uniqueid(
        &self,
        tenant_id: TenantId,
        uniqueid: &str,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM call_records WHERE tenant_id = $1 AND uniqueid = $2",
            CALL_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(uniqueid)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(map_row).transpose()
    }

    #[instrument(skip(self, path), fields(call_record_id = %id.as_uuid()))]
    async fn set_recording_path(
        &self,
        id: CallRecordId,
        path: &StoragePath,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE call_records SET recording_path = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(path.as_str())
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(call_record_id = %id.as_uuid()))]
    async fn mark_processing(&self, id: CallRecordId) -> Result<(), RepositoryError> {
        self.set_status(id, ProcessingStatus::Processing, None, None, None)
            .await
    }

    #[instrument(skip(self, transcript_path, analysis_path), fields(call_record_id = %id.as_uuid()))]
    async fn mark_completed(
        &self,
        id: CallRecordId,
        transcript_path: &StoragePath,
        analysis_path: &StoragePath,
    ) -> Result<(), RepositoryError> {
        self.set_status(
            id,
            ProcessingStatus::Completed,
            None,
            Some(transcript_path.as_str()),
            Some(analysis_path.as_str()),
        )
        .await
    }

    #[instrument(skip(self, error), fields(call_record_id = %id.as_uuid()))]
    async fn mark_failed(&self, id: CallRecordId, error: &str) -> Result<(), RepositoryError> {
        self.set_status(id, ProcessingStatus::Failed, Some(error), None, None)
            .await
    }
}

impl PgCallRepository {
    async fn set_status(
        &self,
        id: CallRecordId,
        status: ProcessingStatus,
        error: Option<&str>,
        transcript_path: Option<&str>,
        analysis_path: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let now: DateTime<Utc> = Utc::now();

        sqlx::query(
            r#"
            UPDATE call_records
            SET processing_status = $1,
                processing_error = $2,
                transcript_path = COALESCE($3, transcript_path),
                analysis_path = COALESCE($4, analysis_path),
                updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(status.as_str())
        .bind(error)
        .bind(transcript_path)
        .bind(analysis_path)
        .bind(now)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }
}
