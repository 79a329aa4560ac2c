use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::ports::{
    CallRepository, ConnectionRepository, JobQueue, RepositoryError,
};
use crate::domain::{
    CallDirection, CallDisposition, CallRecord, CallRecordId, ConnectionId, Job, JobId,
};

/// CDR webhook body as posted by the PBX.
#[derive(Debug, Clone, Deserialize)]
pub struct CdrPayload {
    pub uniqueid: String,
    pub src: String,
    pub dst: String,
    pub start_time: DateTime<Utc>,
    pub answer_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: i64,
    pub disposition: String,
    pub recording_file: Option<String>,
    pub src_trunk_name: Option<String>,
    pub dst_trunk_name: Option<String>,
}

impl CdrPayload {
    /// Trunk fields tell us which leg crossed the PBX boundary: a source
    /// trunk means the call came in from outside, a destination trunk
    /// means it went out. Neither means extension-to-extension.
    fn direction(&self) -> CallDirection {
        let trunk = |name: &Option<String>| {
            name.as_deref().map(str::trim).filter(|t| !t.is_empty()).is_some()
        };
        match (trunk(&self.src_trunk_name), trunk(&self.dst_trunk_name)) {
            (true, _) => CallDirection::Inbound,
            (false, true) => CallDirection::Outbound,
            (false, false) => CallDirection::Internal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub call_record_id: CallRecordId,
    pub duplicate: bool,
    pub job_id: Option<JobId>,
}

pub struct IngestService {
    connection_repository: Arc<dyn ConnectionRepository>,
    call_repository: Arc<dyn CallRepository>,
    job_queue: Arc<dyn JobQueue>,
}

impl IngestService {
    pub fn new(
        connection_repository: Arc<dyn ConnectionRepository>,
        call_repository: Arc<dyn CallRepository>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            connection_repository,
            call_repository,
            job_queue,
        }
    }

    /// Ingest one CDR delivery. Duplicate deliveries (same tenant and
    /// uniqueid) resolve to the existing record; a job is enqueued only
    /// when the call has a recording.
    #[tracing::instrument(skip(self, secret, payload), fields(connection_id = %connection_id.as_uuid(), uniqueid = %payload.uniqueid))]
    pub async fn ingest(
        &self,
        connection_id: ConnectionId,
        secret: &str,
        payload: CdrPayload,
    ) -> Result<IngestOutcome, IngestError> {
        let connection = self
            .connection_repository
            .get_by_id(connection_id)
            .await?
            .ok_or(IngestError::UnknownConnection)?;

        if connection.webhook_secret != secret {
            return Err(IngestError::InvalidSecret);
        }

        if let Some(existing) = self
            .call_repository
            .find_by_uniqueid(connection.tenant_id, &payload.uniqueid)
            .await?
        {
            tracing::info!(call_record_id = %existing.id.as_uuid(), "Duplicate CDR delivery");
            return Ok(IngestOutcome {
                call_record_id: existing.id,
                duplicate: true,
                job_id: None,
            });
        }

        let disposition = CallDisposition::from_str(&payload.disposition)
            .map_err(IngestError::InvalidPayload)?;
        let direction = payload.direction();

        let recording_file = payload
            .recording_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(String::from);

        let record = CallRecord::new(
            connection.tenant_id,
            connection.id,
            payload.uniqueid.clone(),
            payload.src,
            payload.dst,
            direction,
            disposition,
            payload.start_time,
            payload.answer_time,
            payload.end_time,
            payload.duration,
            recording_file.clone(),
        );
        self.call_repository.create(&record).await?;

        let job_id = if recording_file.is_some() {
            let job = Job::new(connection.tenant_id, record.id);
            self.job_queue.enqueue(&job).await?;
            tracing::info!(
                call_record_id = %record.id.as_uuid(),
                job_id = %job.id.as_uuid(),
                "CDR ingested, pipeline job enqueued"
            );
            Some(job.id)
        } else {
            tracing::info!(call_record_id = %record.id.as_uuid(), "CDR ingested without recording");
            None
        };

        Ok(IngestOutcome {
            call_record_id: record.id,
            duplicate: false,
            job_id,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unknown connection")]
    UnknownConnection,
    #[error("invalid webhook secret")]
    InvalidSecret,
    #[error("invalid CDR payload: {0}")]
    InvalidPayload(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
