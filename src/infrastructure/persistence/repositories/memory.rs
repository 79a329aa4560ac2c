use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::{
    AnalysisRepository, CallRepository, ConnectionRepository, JobQueue, RepositoryError,
    UsageRecorder, UsageSample,
};
use crate::domain::{
    CallAnalysis, CallRecord, CallRecordId, ConnectionId, ConnectionStatus, Job, JobId, JobStatus,
    PbxConnection, ProcessingStatus, StoragePath, TenantId,
};

/// In-memory implementations backing tests and local development. They
/// honor the same contracts as the Postgres repositories: unique
/// `(tenant_id, uniqueid)`, claim ordering and exclusivity, insert-once
/// analyses.
#[derive(Default)]
pub struct MemoryCallRepository {
    records: Mutex<Vec<CallRecord>>,
}

impl MemoryCallRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallRepository for MemoryCallRepository {
    async fn create(&self, record: &CallRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.tenant_id == record.tenant_id && r.uniqueid == record.uniqueid)
        {
            return Err(RepositoryError::ConstraintViolation(format!(
                "duplicate uniqueid {}",
                record.uniqueid
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: CallRecordId) -> Result<Option<CallRecord>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_uniqueid(
        &self,
        tenant_id: TenantId,
        uniqueid: &str,
    ) -> Result<Option<CallRecord>, RepositoryError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.uniqueid == uniqueid)
            .cloned())
    }

    async fn set_recording_path(
        &self,
        id: CallRecordId,
        path: &StoragePath,
    ) -> Result<(), RepositoryError> {
        self.update(id, |r| {
            r.recording_path = Some(path.as_str().to_string());
        })
    }

    async fn mark_processing(&self, id: CallRecordId) -> Result<(), RepositoryError> {
        self.update(id, |r| {
            r.processing_status = ProcessingStatus::Processing;
        })
    }

    async fn mark_completed(
        &self,
        id: CallRecordId,
        transcript_path: &StoragePath,
        analysis_path: &StoragePath,
    ) -> Result<(), RepositoryError> {
        self.update(id, |r| {
            r.processing_status = ProcessingStatus::Completed;
            r.processing_error = None;
            r.transcript_path = Some(transcript_path.as_str().to_string());
            r.analysis_path = Some(analysis_path.as_str().to_string());
        })
    }

    async fn mark_failed(&self, id: CallRecordId, error: &str) -> Result<(), RepositoryError> {
        self.update(id, |r| {
            r.processing_status = ProcessingStatus::Failed;
            r.processing_error = Some(error.to_string());
        })
    }
}

impl MemoryCallRepository {
    fn update(
        &self,
        id: CallRecordId,
        mutate: impl FnOnce(&mut CallRecord),
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("call record {}", id.as_uuid())))?;
        mutate(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryConnectionRepository {
    connections: Mutex<Vec<PbxConnection>>,
}

impl MemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection: PbxConnection) {
        self.connections.lock().unwrap().push(connection);
    }
}

#[async_trait]
impl ConnectionRepository for MemoryConnectionRepository {
    async fn get_by_id(&self, id: ConnectionId) -> Result<Option<PbxConnection>, RepositoryError> {
        let connections = self.connections.lock().unwrap();
        Ok(connections.iter().find(|c| c.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: ConnectionId,
        status: ConnectionStatus,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut connections = self.connections.lock().unwrap();
        let connection = connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("connection {}", id.as_uuid())))?;
        connection.status = status;
        connection.last_error = last_error.map(String::from);
        connection.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAnalysisRepository {
    analyses: Mutex<Vec<CallAnalysis>>,
}

impl MemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.analyses.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalysisRepository for MemoryAnalysisRepository {
    async fn insert(&self, analysis: &CallAnalysis) -> Result<(), RepositoryError> {
        let mut analyses = self.analyses.lock().unwrap();
        if analyses
            .iter()
            .any(|a| a.call_record_id == analysis.call_record_id)
        {
            return Err(RepositoryError::ConstraintViolation(format!(
                "analysis already exists for call record {}",
                analysis.call_record_id.as_uuid()
            )));
        }
        analyses.push(analysis.clone());
        Ok(())
    }

    async fn get_by_call_record(
        &self,
        call_record_id: CallRecordId,
    ) -> Result<Option<CallAnalysis>, RepositoryError> {
        let analyses = self.analyses.lock().unwrap();
        Ok(analyses
            .iter()
            .find(|a| a.call_record_id == call_record_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: &Job) -> Result<(), RepositoryError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn claim_next(&self) -> Result<Option<Job>, RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let now = Utc::now();

        // Same ordering as the SQL claim: lowest priority value first,
        // then oldest. The mutex plays the role of the row lock.
        let next = jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending && j.scheduled_for <= now)
            .min_by_key(|j| (j.priority, j.created_at));

        match next {
            Some(job) => {
                job.status = JobStatus::Processing;
                job.started_at = Some(now);
                job.attempts += 1;
                job.updated_at = now;
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, id: JobId, result: serde_json::Value) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = find_job(&mut jobs, id)?;
        let now = Utc::now();
        job.status = JobStatus::Completed;
        job.completed_at = Some(now);
        job.result = Some(result);
        job.updated_at = now;
        Ok(())
    }

    async fn record_failure(&self, id: JobId, error: &str) -> Result<JobStatus, RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = find_job(&mut jobs, id)?;
        let now = Utc::now();
        job.error_message = Some(error.to_string());
        if job.attempts >= job.max_attempts {
            job.status = JobStatus::Failed;
            job.completed_at = Some(now);
        } else {
            job.status = JobStatus::Pending;
        }
        job.updated_at = now;
        Ok(job.status)
    }

    async fn reset_stale(&self, older_than: Duration) -> Result<u64, RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than)
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut reset = 0;
        for job in jobs.iter_mut() {
            if job.status == JobStatus::Processing
                && job.started_at.map(|t| t < cutoff).unwrap_or(false)
            {
                job.status = JobStatus::Pending;
                job.started_at = None;
                job.updated_at = Utc::now();
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().filter(|j| j.status == status).cloned().collect())
    }
}

fn find_job<'a>(jobs: &'a mut [Job], id: JobId) -> Result<&'a mut Job, RepositoryError> {
    jobs.iter_mut()
        .find(|j| j.id == id)
        .ok_or_else(|| RepositoryError::NotFound(format!("job {}", id.as_uuid())))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UsageTotals {
    pub calls_processed: i64,
    pub audio_seconds: i64,
    pub storage_bytes: i64,
}

#[derive(Default)]
pub struct MemoryUsageRecorder {
    totals: Mutex<HashMap<Uuid, UsageTotals>>,
}

impl MemoryUsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self, tenant_id: TenantId) -> UsageTotals {
        self.totals
            .lock()
            .unwrap()
            .get(&tenant_id.as_uuid())
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl UsageRecorder for MemoryUsageRecorder {
    async fn record(
        &self,
        tenant_id: TenantId,
        sample: UsageSample,
    ) -> Result<(), RepositoryError> {
        let mut totals = self.totals.lock().unwrap();
        let entry = totals.entry(tenant_id.as_uuid()).or_default();
        entry.calls_processed += sample.calls_processed;
        entry.audio_seconds += sample.audio_seconds;
        entry.storage_bytes += sample.storage_bytes;
        Ok(())
    }
}
